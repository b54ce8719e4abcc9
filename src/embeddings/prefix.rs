use serde::Deserialize;

/// Role of the texts in a request. E5 models expect every input to be tagged
/// with `query: ` or `passage: `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum TextType {
    Query,
    #[default]
    Passage,
}

impl TextType {
    pub fn prefix(self) -> &'static str {
        match self {
            TextType::Query => "query: ",
            TextType::Passage => "passage: ",
        }
    }
}

// Anything other than the exact literal "query" is treated as a passage.
impl From<String> for TextType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&str> for TextType {
    fn from(value: &str) -> Self {
        if value == "query" {
            TextType::Query
        } else {
            TextType::Passage
        }
    }
}

pub fn apply_prefix(texts: &[String], text_type: TextType) -> Vec<String> {
    let prefix = text_type.prefix();
    texts.iter().map(|text| format!("{prefix}{text}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn query_prefix_keeps_order() {
        let out = apply_prefix(&strings(&["kucing", "anjing"]), TextType::Query);
        assert_eq!(out, strings(&["query: kucing", "query: anjing"]));
    }

    #[test]
    fn passage_prefix() {
        let out = apply_prefix(&strings(&["Kucing tidur di sofa."]), TextType::Passage);
        assert_eq!(out, strings(&["passage: Kucing tidur di sofa."]));
    }

    #[test]
    fn empty_batch_stays_empty() {
        assert!(apply_prefix(&[], TextType::Query).is_empty());
    }

    #[test]
    fn only_exact_query_selects_query() {
        assert_eq!(TextType::from("query"), TextType::Query);
        assert_eq!(TextType::from("passage"), TextType::Passage);
        assert_eq!(TextType::from("Query"), TextType::Passage);
        assert_eq!(TextType::from("document"), TextType::Passage);
        assert_eq!(TextType::from(""), TextType::Passage);
        assert_eq!(TextType::default(), TextType::Passage);
    }
}
