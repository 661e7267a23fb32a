/// Dotted key prefix used while building the graph, e.g.
/// `text_decoder.layers.3.self_attn`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterPath {
    prefix: Option<String>,
}

impl ParameterPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(name: &str) -> Self {
        Self::root().subtree(name)
    }

    pub fn as_str(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }

    pub fn subtree(
        &self,
        name: &str,
    ) -> Self {
        Self {
            prefix: Some(join_key(self.prefix.as_deref(), name)),
        }
    }

    /// Full registry key of a parameter directly under this path.
    pub fn key(
        &self,
        leaf: &str,
    ) -> String {
        join_key(self.prefix.as_deref(), leaf)
    }
}

pub(crate) fn join_key(
    prefix: Option<&str>,
    name: &str,
) -> String {
    prefix.map_or_else(|| name.to_string(), |p| format!("{p}.{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_dot_joined() {
        let layer = ParameterPath::new("text_decoder").subtree("layers.0");
        assert_eq!(layer.as_str(), "text_decoder.layers.0");
        assert_eq!(
            layer.subtree("self_attn").subtree("q_proj").key("weight"),
            "text_decoder.layers.0.self_attn.q_proj.weight"
        );
        assert_eq!(ParameterPath::root().key("weight"), "weight");
    }
}
