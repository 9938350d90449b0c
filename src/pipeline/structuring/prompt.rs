use std::fmt::Write;

use super::types::Section;

pub const FACT_CHECK_SYSTEM_PROMPT: &str = "You are an expert medical fact-checker and practicing physician. \
Your task is to analyze health claims and identify medical misinformation. \
You must always respond in English. \
Use professional but accessible language for the general public.";

/// Build the user turn: the claim followed by the nine-section answer contract.
pub fn build_fact_check_prompt(claim: &str) -> String {
    let mut prompt = format!(
        "Perform a professional medical fact-check on the following health claim:\n\n\
         <claim>\n{claim}\n</claim>\n\n\
         Respond in the following format (keep each bracketed tag):\n"
    );
    for section in Section::ALL {
        // Writing to a String cannot fail.
        let _ = write!(prompt, "\n[{}] {}\n", section.label(), section.instruction());
    }
    prompt
}
