// File: ./src/materials/rules.rs
// Keyword tables behind material inference. Order matters only where a
// table is consulted with `first_match`.
use crate::model::{MaterialCategory, MaterialPriority};
use crate::rules::{KeywordRule, MatchMode, RuleTable};

use MaterialCategory::{Digital, Equipment, Physical, Printable, Supplies};

#[derive(Debug)]
pub struct Inferred {
    pub name: &'static str,
    pub category: MaterialCategory,
}

#[derive(Debug)]
pub struct BaselineItem {
    pub name: &'static str,
    pub category: MaterialCategory,
    pub priority: MaterialPriority,
}

const fn text(
    keywords: &'static [&'static str],
    name: &'static str,
    category: MaterialCategory,
) -> KeywordRule<Inferred> {
    KeywordRule {
        keywords,
        value: Inferred { name, category },
    }
}

/// Scanned against an activity's lowercased title and description. Every
/// matching group contributes one item.
pub static TEXT_RULES: RuleTable<Inferred> = RuleTable::new(MatchMode::Substring, TEXT);

const TEXT: &[KeywordRule<Inferred>] = &[
    text(&["paper", "worksheet", "handout"], "Paper/Worksheets", Printable),
    text(&["scissors", "glue", "tape"], "Art supplies", Supplies),
    text(&["computer", "tablet", "laptop", "chromebook", "ipad"], "Technology", Equipment),
    text(&["video", "youtube", "film", "movie"], "Video content", Digital),
    text(&["book", "novel", "textbook", "reader"], "Books", Physical),
    text(&["marker", "crayon", "colored pencil", "highlighter"], "Markers/Crayons", Supplies),
    text(&["whiteboard", "dry erase", "smartboard"], "Whiteboard", Equipment),
    text(&["projector", "slides", "slideshow"], "Projector", Equipment),
    text(&["calculator"], "Calculator", Equipment),
    text(&["ruler", "measur", "tape measure"], "Rulers", Physical),
    text(&["manipulative", "counters", "cubes", "base ten", "blocks"], "Math manipulatives", Physical),
    text(&["chart", "poster"], "Charts/Posters", Printable),
    text(&["paint", "brush", "easel"], "Paint supplies", Supplies),
    text(&["ball", "cone", "hoop", "gym"], "PE equipment", Equipment),
    text(&["microscope", "magnifying", "beaker", "goggles"], "Science equipment", Equipment),
    text(&["website", "online", "internet"], "Online resources", Digital),
    text(&["audio", "headphone", "song", "podcast"], "Audio", Digital),
];

const fn cat(
    keywords: &'static [&'static str],
    category: MaterialCategory,
) -> KeywordRule<MaterialCategory> {
    KeywordRule {
        keywords,
        value: category,
    }
}

/// Categorizes one item of an explicit materials list by its own name.
/// No match means `Physical`.
pub static ITEM_RULES: RuleTable<MaterialCategory> = RuleTable::new(MatchMode::Substring, ITEMS);

const ITEMS: &[KeywordRule<MaterialCategory>] = &[
    cat(&["pdf", "worksheet", "handout", "printout", "copies", "copy of"], Printable),
    cat(&["video", "online", "website", "link", "slides", "digital"], Digital),
    cat(
        &["computer", "tablet", "laptop", "ipad", "projector", "calculator", "microscope", "speaker", "camera"],
        Equipment,
    ),
    cat(
        &["scissors", "glue", "tape", "marker", "crayon", "pencil", "pen", "paint", "paper", "stapler"],
        Supplies,
    ),
];

/// Categorizes a linked resource by declared type and filename.
/// No match means `Supplies`.
pub static RESOURCE_RULES: RuleTable<MaterialCategory> =
    RuleTable::new(MatchMode::Substring, RESOURCES);

const RESOURCES: &[KeywordRule<MaterialCategory>] = &[
    cat(&["pdf", "worksheet", "handout", ".doc", "print"], Printable),
    cat(&["video", "online", "link", "url", "http", ".mp4", "youtube", "slides"], Digital),
    cat(&["equipment", "device"], Equipment),
];

const fn base(
    name: &'static str,
    category: MaterialCategory,
    priority: MaterialPriority,
) -> BaselineItem {
    BaselineItem {
        name,
        category,
        priority,
    }
}

/// Every activity needs these.
pub static BASELINE: &[BaselineItem] = &[
    base("Pencils/Pens", Supplies, MaterialPriority::Essential),
    base("Paper", Supplies, MaterialPriority::Essential),
];

/// Subject-typical items, matched on the subject name.
pub static SUBJECT_RULES: RuleTable<&'static [BaselineItem]> =
    RuleTable::new(MatchMode::Word, SUBJECTS);

const SUBJECTS: &[KeywordRule<&'static [BaselineItem]>] = &[
    KeywordRule {
        keywords: &["math", "maths", "mathematics", "numeracy", "algebra", "geometry"],
        value: &[
            base("Math manipulatives", Physical, MaterialPriority::Recommended),
            base("Calculator", Equipment, MaterialPriority::Optional),
        ],
    },
    KeywordRule {
        keywords: &["science", "biology", "chemistry", "physics"],
        value: &[
            base("Science notebooks", Physical, MaterialPriority::Recommended),
            base("Safety goggles", Equipment, MaterialPriority::Optional),
        ],
    },
    KeywordRule {
        keywords: &["language", "english", "literacy", "reading", "writing", "ela"],
        value: &[
            base("Reading books", Physical, MaterialPriority::Recommended),
            base("Dictionary", Physical, MaterialPriority::Optional),
        ],
    },
    KeywordRule {
        keywords: &["art", "arts", "drawing", "painting", "visual"],
        value: &[
            base("Art supplies", Supplies, MaterialPriority::Recommended),
            base("Smocks/Aprons", Physical, MaterialPriority::Optional),
        ],
    },
];

/// Fallbacks keyed by normalized material name.
static ALTERNATIVES: &[(&str, &[&str])] = &[
    ("technology", &["Printed copies of digital materials", "Paper-based version of the activity"]),
    ("videocontent", &["Read-aloud of a related text", "Printed summary with discussion questions"]),
    ("onlineresources", &["Printed copies of the pages", "Textbook section on the same topic"]),
    ("projector", &["Whiteboard", "Printed handouts"]),
    ("calculator", &["Paper and pencil calculation", "Multiplication chart"]),
    ("mathmanipulatives", &["Drawn models on paper", "Counters from the class supply"]),
    ("whiteboard", &["Chart paper", "Individual mini whiteboards"]),
    ("audio", &["Teacher read-aloud"]),
    ("markerscrayons", &["Colored pencils"]),
    ("paintsupplies", &["Colored pencils", "Crayons"]),
    ("peequipment", &["Movement games without equipment"]),
    ("scienceequipment", &["Observation drawing activity", "Demonstration video"]),
];

pub fn alternatives_for(normalized_name: &str) -> &'static [&'static str] {
    ALTERNATIVES
        .iter()
        .find(|(name, _)| *name == normalized_name)
        .map(|(_, alts)| *alts)
        .unwrap_or(&[])
}
