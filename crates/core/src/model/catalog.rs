//! Bundled question sets used by `QuestionBank::builtin`.

use crate::model::question::{Question, QuestionError};

type Entry = (&'static str, &'static str, [&'static str; 4], usize);

const DEFAULT: [Entry; 10] = [
    (
        "1",
        "What is the law of demand in economics?",
        [
            "When price increases, demand decreases",
            "When price decreases, demand increases",
            "Price and demand are unrelated",
            "Supply determines demand",
        ],
        0,
    ),
    (
        "2",
        "What is market equilibrium?",
        [
            "When supply equals demand",
            "When prices are at their highest",
            "When there is no competition",
            "When government controls prices",
        ],
        0,
    ),
    (
        "3",
        "What causes a shift in the supply curve?",
        [
            "Change in consumer preferences",
            "Change in production costs",
            "Change in consumer income",
            "Change in population",
        ],
        1,
    ),
    (
        "4",
        "What is price elasticity of demand?",
        [
            "How much quantity demanded changes when price changes",
            "How much price changes when supply changes",
            "The total revenue from sales",
            "The cost of production",
        ],
        0,
    ),
    (
        "5",
        "What characterizes perfect competition?",
        [
            "One seller controls the market",
            "Few sellers with similar products",
            "Many sellers with identical products",
            "Government-regulated prices",
        ],
        2,
    ),
    (
        "6",
        "What is a monopoly?",
        [
            "Many sellers competing",
            "Two sellers dominating",
            "One seller controlling the market",
            "Government ownership",
        ],
        2,
    ),
    (
        "7",
        "What is consumer surplus?",
        [
            "Extra money consumers save",
            "Difference between what consumers pay and what they are willing to pay",
            "Total spending by consumers",
            "Government subsidies",
        ],
        1,
    ),
    (
        "8",
        "What is opportunity cost?",
        [
            "The price of a product",
            "The cost of production",
            "The value of the next best alternative foregone",
            "The total cost of all options",
        ],
        2,
    ),
    (
        "9",
        "What is inflation?",
        [
            "Decrease in prices over time",
            "Increase in prices over time",
            "Stable prices",
            "Government price controls",
        ],
        1,
    ),
    (
        "10",
        "What is GDP?",
        [
            "Government Debt Product",
            "Gross Domestic Product",
            "General Development Plan",
            "Global Distribution Process",
        ],
        1,
    ),
];

const ABMA: [Entry; 10] = [
    (
        "abma-1",
        "Which function of management involves setting objectives and deciding how to achieve them?",
        ["Planning", "Organising", "Leading", "Controlling"],
        0,
    ),
    (
        "abma-2",
        "What does a SWOT analysis examine?",
        [
            "Sales, wages, overheads and taxes",
            "Strengths, weaknesses, opportunities and threats",
            "Suppliers, workers, owners and trade unions",
            "Stock, work in progress, orders and turnover",
        ],
        1,
    ),
    (
        "abma-3",
        "Which business structure gives owners unlimited liability?",
        [
            "Private limited company",
            "Public limited company",
            "Sole trader",
            "Co-operative with limited liability",
        ],
        2,
    ),
    (
        "abma-4",
        "What is the main purpose of a cash flow forecast?",
        [
            "To calculate annual profit",
            "To value fixed assets",
            "To predict future inflows and outflows of cash",
            "To record past sales",
        ],
        2,
    ),
    (
        "abma-5",
        "Which element of the marketing mix concerns where a product is sold?",
        ["Product", "Price", "Promotion", "Place"],
        3,
    ),
    (
        "abma-6",
        "In Maslow's hierarchy, which need sits at the top?",
        [
            "Safety",
            "Self-actualisation",
            "Esteem",
            "Physiological",
        ],
        1,
    ),
    (
        "abma-7",
        "What is a stakeholder?",
        [
            "Only a shareholder of the business",
            "Any individual or group with an interest in the business",
            "A supplier who extends credit",
            "A manager on the board of directors",
        ],
        1,
    ),
    (
        "abma-8",
        "Which ratio measures a firm's ability to pay short-term debts?",
        [
            "Current ratio",
            "Gross profit margin",
            "Return on capital employed",
            "Gearing ratio",
        ],
        0,
    ),
    (
        "abma-9",
        "What is the break-even point?",
        [
            "Where sales are highest",
            "Where total revenue equals total costs",
            "Where fixed costs are zero",
            "Where variable costs exceed revenue",
        ],
        1,
    ),
    (
        "abma-10",
        "Which recruitment method fills a vacancy from within the organisation?",
        [
            "External advertising",
            "Recruitment agency",
            "Internal promotion",
            "Job centre listing",
        ],
        2,
    ),
];

fn build(entries: &[Entry]) -> Result<Vec<Question>, QuestionError> {
    entries
        .iter()
        .map(|(id, prompt, options, correct)| {
            let options = options.iter().map(|o| (*o).to_owned()).collect();
            Question::new(*id, *prompt, options, *correct)
        })
        .collect()
}

pub(crate) fn default_questions() -> Result<Vec<Question>, QuestionError> {
    build(&DEFAULT)
}

pub(crate) fn abma_questions() -> Result<Vec<Question>, QuestionError> {
    build(&ABMA)
}
