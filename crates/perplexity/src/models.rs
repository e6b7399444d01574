//! Registry of the Sonar model tiers.

/// A model id with its one-line tradeoff description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: &'static str,
    pub description: &'static str,
}

/// Model used when a call does not name one.
pub const DEFAULT_MODEL: &str = "sonar";

const MODELS: &[ModelEntry] = &[
    ModelEntry {
        id: "sonar",
        description: "Lightweight, real-time search with citations (Llama 3.3 70B foundation)",
    },
    ModelEntry {
        id: "sonar-pro",
        description: "Enhanced search with richer context and deeper multi-step queries",
    },
    ModelEntry {
        id: "sonar-reasoning",
        description: "Real-time reasoning with live search and Chain-of-Thought inference",
    },
    ModelEntry {
        id: "sonar-reasoning-pro",
        description: "Advanced step-by-step reasoning (DeepSeek-R1 powered)",
    },
    ModelEntry {
        id: "sonar-deep-research",
        description: "Long-form research, synthesis, and reporting with async support",
    },
];

/// All models, in registry order.
pub fn list_models() -> &'static [ModelEntry] {
    MODELS
}

pub fn is_valid(id: &str) -> bool {
    MODELS.iter().any(|m| m.id == id)
}

/// Comma-separated model ids, in registry order.
pub fn model_ids() -> String {
    MODELS.iter().map(|m| m.id).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_five_tiers_in_order() {
        let ids: Vec<_> = list_models().iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            [
                "sonar",
                "sonar-pro",
                "sonar-reasoning",
                "sonar-reasoning-pro",
                "sonar-deep-research"
            ]
        );
        assert!(list_models().iter().all(|m| !m.description.is_empty()));
    }

    #[test]
    fn validity() {
        assert!(is_valid(DEFAULT_MODEL));
        assert!(is_valid("sonar-deep-research"));
        assert!(!is_valid("gpt-4"));
        assert!(!is_valid("Sonar"));
        assert!(!is_valid(""));
    }

    #[test]
    fn ids_joined() {
        assert_eq!(
            model_ids(),
            "sonar, sonar-pro, sonar-reasoning, sonar-reasoning-pro, sonar-deep-research"
        );
    }
}
