use damagemap_core::model::{DamageLabel, PixelBox, Vocabulary};
use std::fmt::Write as _;

pub const PRE_CAPTION: &str = "PRE-DISASTER IMAGE:";
pub const POST_CAPTION: &str = "POST-DISASTER IMAGE:";

fn definition(label: DamageLabel) -> &'static str {
    match label {
        DamageLabel::NoDamage => "Building looks the same, roof intact, structure unchanged",
        DamageLabel::MinorDamage => "Small changes visible but building is structurally intact",
        DamageLabel::MajorDamage => {
            "Partial collapse, large roof loss or significant structural damage, but not gone"
        }
        DamageLabel::Destroyed => "Building is gone, reduced to rubble/ash/foundation only",
        DamageLabel::Unclassified => "",
    }
}

/// Instruction text listing every building of the batch by uid and pixel box.
pub fn build_prompt(batch: &[PixelBox], vocab: Vocabulary) -> String {
    let labels = vocab.labels();
    let mut p = String::new();

    p.push_str("You are an expert satellite imagery disaster damage assessor.\n\n");
    p.push_str("I'm showing you two satellite images of the same area:\n");
    p.push_str("1. FIRST IMAGE: PRE-DISASTER (before the event)\n");
    p.push_str("2. SECOND IMAGE: POST-DISASTER (after the event)\n\n");
    let _ = writeln!(
        p,
        "There are {} buildings in this image that I need you to classify.",
        batch.len()
    );
    p.push_str(
        "Each building's location is given as a pixel bounding box [x1,y1 to x2,y2] \
         where (0,0) is the top-left corner.\n\n",
    );

    p.push_str("Buildings to classify:\n");
    for b in batch {
        let r = &b.rect;
        let _ = writeln!(
            p,
            "  - UID: {}, Location: pixel bbox [{},{} to {},{}]",
            b.uid, r.x1, r.y1, r.x2, r.y2
        );
    }

    p.push_str(
        "\nFor EACH building, compare its appearance in the pre vs post image at the given \
         pixel location and classify as:\n",
    );
    for label in labels {
        let _ = writeln!(p, "- \"{}\": {}", label, definition(*label));
    }

    let quoted: Vec<String> = labels.iter().map(|l| format!("\"{l}\"")).collect();
    let _ = write!(p, "\nYou MUST use ONLY these labels: {}.", quoted.join(", "));
    if !vocab.contains(DamageLabel::MajorDamage) {
        p.push_str(" Do NOT use \"major-damage\" or any other label.");
    }
    p.push_str("\n\n");

    p.push_str("CRITICAL RULES:\n");
    p.push_str("- Look at EACH building individually at its specific pixel location\n");
    p.push_str("- Not all buildings will have the same damage - examine each one carefully\n");
    p.push_str("- Return exactly one entry per building and copy its UID verbatim\n");
    p.push_str("- Provide your honest best assessment for each\n\n");

    p.push_str("Return ONLY a JSON array (no markdown, no explanation):\n");
    p.push_str("[\n");
    p.push_str(
        "  {\"uid\": \"abc123\", \"damage\": \"destroyed\", \"confidence\": 0.9, \
         \"description\": \"Reduced to ash\"},\n",
    );
    p.push_str(
        "  {\"uid\": \"def456\", \"damage\": \"no-damage\", \"confidence\": 0.85, \
         \"description\": \"Roof and structure intact\"}\n",
    );
    p.push_str("]");
    p
}
