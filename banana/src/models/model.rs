//! Backend model selection.

/// Short names accepted on the command line and the model ids they map to.
pub const MODELS: &[(&str, &str)] = &[
    ("flash", "gemini-2.5-flash-image"),
    ("pro", "gemini-3-pro-image-preview"),
];

/// Model used when none is selected.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Resolve a short name or full model id to a full model id.
pub fn resolve_model(name: &str) -> Option<&'static str> {
    MODELS
        .iter()
        .find(|(short, full)| *short == name || *full == name)
        .map(|(_, full)| *full)
}

/// `clap` value parser for `--model`.
pub fn parse_model(name: &str) -> Result<String, String> {
    resolve_model(name).map(str::to_string).ok_or_else(|| {
        let choices: Vec<_> = MODELS
            .iter()
            .flat_map(|(short, full)| [*short, *full])
            .collect();
        format!("unknown model '{name}' (choose from: {})", choices.join(", "))
    })
}

/// Whether the model accepts an explicit output resolution.
pub fn supports_resolution(model: &str) -> bool {
    model.to_lowercase().contains("pro")
}
