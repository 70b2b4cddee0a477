//! Static achievement catalog
//!
//! The full set of mintable achievements, embedded read-only. Ids are
//! stable; mint records reference them forever, so entries are never
//! renumbered or removed.

use serde::Serialize;

/// Curriculum area an achievement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Budgeting,
    Saving,
    Credit,
    Investing,
    Taxes,
    Borrowing,
}

/// Difficulty tier of the lesson track behind an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Beginner,
    Intermediate,
}

/// One mintable achievement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub xp_required: u32,
    pub image_ref: &'static str,
    pub category: Category,
    pub level: Level,
}

/// Look up an achievement by catalog id
pub fn lookup(id: u32) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: 1,
        title: "Budget Basics",
        description: "Learned what a budget is and why it matters for financial health.",
        xp_required: 100,
        image_ref: "/assets/achievements/1.jpg",
        category: Category::Budgeting,
        level: Level::Beginner,
    },
    Achievement {
        id: 2,
        title: "First Budget Creator",
        description: "Built your very first simple budget using real-world numbers.",
        xp_required: 120,
        image_ref: "/assets/achievements/2.jpg",
        category: Category::Budgeting,
        level: Level::Beginner,
    },
    Achievement {
        id: 3,
        title: "Budgeting Strategist",
        description: "Learned about 50/30/20 rule and zero-based budgeting methods.",
        xp_required: 140,
        image_ref: "/assets/achievements/3.jpg",
        category: Category::Budgeting,
        level: Level::Intermediate,
    },
    Achievement {
        id: 4,
        title: "Adaptive Budgeter",
        description: "Learned how to adjust budgets for emergencies and unexpected expenses.",
        xp_required: 160,
        image_ref: "/assets/achievements/4.jpg",
        category: Category::Budgeting,
        level: Level::Intermediate,
    },
    Achievement {
        id: 5,
        title: "Smart Budgeter",
        description: "Discovered tools and apps that make budgeting easier and smarter.",
        xp_required: 180,
        image_ref: "/assets/achievements/5.jpg",
        category: Category::Budgeting,
        level: Level::Intermediate,
    },
    Achievement {
        id: 6,
        title: "Savings Starter",
        description: "Understood why saving matters and the role of emergency funds.",
        xp_required: 200,
        image_ref: "/assets/achievements/6.jpg",
        category: Category::Saving,
        level: Level::Beginner,
    },
    Achievement {
        id: 7,
        title: "Savings Planner",
        description: "Set up short-term, medium-term, and long-term savings goals.",
        xp_required: 220,
        image_ref: "/assets/achievements/7.jpg",
        category: Category::Saving,
        level: Level::Intermediate,
    },
    Achievement {
        id: 8,
        title: "Savings Strategist",
        description: "Explored various saving instruments like savings accounts, FDs, and RDs.",
        xp_required: 240,
        image_ref: "/assets/achievements/8.jpg",
        category: Category::Saving,
        level: Level::Intermediate,
    },
    Achievement {
        id: 9,
        title: "Compound Wizard",
        description: "Learned the magic of starting early and the power of compound interest.",
        xp_required: 260,
        image_ref: "/assets/achievements/9.jpg",
        category: Category::Saving,
        level: Level::Intermediate,
    },
    Achievement {
        id: 10,
        title: "Credit Explorer",
        description: "Discovered what credit is and why it matters.",
        xp_required: 280,
        image_ref: "/assets/achievements/10.jpg",
        category: Category::Credit,
        level: Level::Beginner,
    },
    Achievement {
        id: 11,
        title: "Credit Score Starter",
        description: "Learned what a credit score is and why it's important.",
        xp_required: 300,
        image_ref: "/assets/achievements/11.jpg",
        category: Category::Credit,
        level: Level::Beginner,
    },
    Achievement {
        id: 12,
        title: "Credit Influencer",
        description: "Discovered the factors that affect your credit score.",
        xp_required: 320,
        image_ref: "/assets/achievements/12.jpg",
        category: Category::Credit,
        level: Level::Intermediate,
    },
    Achievement {
        id: 13,
        title: "Credit Repairer",
        description: "Learned how to repair and improve a bad credit score.",
        xp_required: 340,
        image_ref: "/assets/achievements/13.jpg",
        category: Category::Credit,
        level: Level::Intermediate,
    },
    Achievement {
        id: 14,
        title: "Debt Defender",
        description: "Learned how to avoid debt traps and manage borrowing smartly.",
        xp_required: 360,
        image_ref: "/assets/achievements/14.jpg",
        category: Category::Credit,
        level: Level::Intermediate,
    },
    Achievement {
        id: 15,
        title: "Investment Beginner",
        description: "Understood what investing is and why it matters.",
        xp_required: 380,
        image_ref: "/assets/achievements/15.jpg",
        category: Category::Investing,
        level: Level::Beginner,
    },
    Achievement {
        id: 16,
        title: "Investment Explorer",
        description: "Learned about basic investment options: stocks, bonds, mutual funds, etc.",
        xp_required: 400,
        image_ref: "/assets/achievements/16.jpg",
        category: Category::Investing,
        level: Level::Beginner,
    },
    Achievement {
        id: 17,
        title: "Risk Manager",
        description: "Understood the relationship between risk and reward in investments.",
        xp_required: 420,
        image_ref: "/assets/achievements/17.jpg",
        category: Category::Investing,
        level: Level::Intermediate,
    },
    Achievement {
        id: 18,
        title: "Compound Investor",
        description: "Mastered the magic of compounding in growing wealth.",
        xp_required: 440,
        image_ref: "/assets/achievements/18.jpg",
        category: Category::Investing,
        level: Level::Intermediate,
    },
    Achievement {
        id: 19,
        title: "Young Investor",
        description: "Learned how to start investing young using SIPs, robo-advisors, and stock apps.",
        xp_required: 460,
        image_ref: "/assets/achievements/19.jpg",
        category: Category::Investing,
        level: Level::Intermediate,
    },
    Achievement {
        id: 20,
        title: "Tax Explorer",
        description: "Learned why we pay taxes and their role in society.",
        xp_required: 480,
        image_ref: "/assets/achievements/20.jpg",
        category: Category::Taxes,
        level: Level::Beginner,
    },
    Achievement {
        id: 21,
        title: "Income Tax Learner",
        description: "Learned basics of income tax and tax slabs.",
        xp_required: 500,
        image_ref: "/assets/achievements/21.jpg",
        category: Category::Taxes,
        level: Level::Beginner,
    },
    Achievement {
        id: 22,
        title: "ITR Filer",
        description: "Learned how to file Income Tax Returns (ITR) step-by-step.",
        xp_required: 520,
        image_ref: "/assets/achievements/22.jpg",
        category: Category::Taxes,
        level: Level::Intermediate,
    },
    Achievement {
        id: 23,
        title: "GST Navigator",
        description: "Understood GST and its impact on everyday purchases.",
        xp_required: 540,
        image_ref: "/assets/achievements/23.jpg",
        category: Category::Taxes,
        level: Level::Intermediate,
    },
    Achievement {
        id: 24,
        title: "Tax Saver",
        description: "Learned legal ways to save on taxes through deductions and planning.",
        xp_required: 560,
        image_ref: "/assets/achievements/24.jpg",
        category: Category::Taxes,
        level: Level::Intermediate,
    },
    Achievement {
        id: 25,
        title: "Debt Beginner",
        description: "Understood the basics of borrowing money and types of debt.",
        xp_required: 580,
        image_ref: "/assets/achievements/25.jpg",
        category: Category::Borrowing,
        level: Level::Beginner,
    },
    Achievement {
        id: 26,
        title: "Debt Classifier",
        description: "Learned the difference between good debt and bad debt (student loans, credit cards, car loans).",
        xp_required: 600,
        image_ref: "/assets/achievements/26.jpg",
        category: Category::Borrowing,
        level: Level::Intermediate,
    },
    Achievement {
        id: 27,
        title: "Interest Analyzer",
        description: "Learned how interest works and impacts borrowing.",
        xp_required: 620,
        image_ref: "/assets/achievements/27.jpg",
        category: Category::Borrowing,
        level: Level::Intermediate,
    },
    Achievement {
        id: 28,
        title: "Smart Borrower",
        description: "Mastered how to borrow smartly by understanding terms before taking a loan.",
        xp_required: 640,
        image_ref: "/assets/achievements/28.jpg",
        category: Category::Borrowing,
        level: Level::Intermediate,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique_and_dense() {
        let ids: HashSet<u32> = CATALOG.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
        assert_eq!(CATALOG.len(), 28);
        for (i, achievement) in CATALOG.iter().enumerate() {
            assert_eq!(achievement.id, (i + 1) as u32);
        }
    }

    #[test]
    fn test_xp_requirements_increase_monotonically() {
        for pair in CATALOG.windows(2) {
            assert!(pair[0].xp_required < pair[1].xp_required);
        }
        assert_eq!(CATALOG[0].xp_required, 100);
        assert_eq!(CATALOG[27].xp_required, 640);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(1).unwrap().title, "Budget Basics");
        assert_eq!(lookup(28).unwrap().title, "Smart Borrower");
        assert!(lookup(0).is_none());
        assert!(lookup(29).is_none());
    }

    #[test]
    fn test_image_refs_match_ids() {
        for achievement in CATALOG {
            assert_eq!(
                achievement.image_ref,
                format!("/assets/achievements/{}.jpg", achievement.id)
            );
        }
    }
}
