// Shared prompt fragments used by more than one caller.
// Feature-specific prompts live next to the feature (see resume/prompts.rs).

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT include explanations or apologies.";

/// Closing instruction appended to every prompt that expects JSON back.
pub const JSON_ONLY_SUFFIX: &str = "Provide your analysis in valid JSON format only, no additional text.";
