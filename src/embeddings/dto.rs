use serde::{Deserialize, Serialize};

use super::prefix::TextType;

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub text_type: TextType,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_type_defaults_to_passage() {
        let req: EmbedRequest = serde_json::from_value(json!({ "texts": ["a"] })).unwrap();
        assert_eq!(req.text_type, TextType::Passage);
        assert_eq!(req.texts, vec!["a".to_string()]);
    }

    #[test]
    fn unknown_text_type_is_passage() {
        let req: EmbedRequest =
            serde_json::from_value(json!({ "texts": [], "text_type": "document" })).unwrap();
        assert_eq!(req.text_type, TextType::Passage);

        let req: EmbedRequest =
            serde_json::from_value(json!({ "texts": [], "text_type": "query" })).unwrap();
        assert_eq!(req.text_type, TextType::Query);
    }

    #[test]
    fn texts_are_required() {
        assert!(serde_json::from_value::<EmbedRequest>(json!({ "text_type": "query" })).is_err());
        assert!(serde_json::from_value::<EmbedRequest>(json!({ "texts": [1, 2] })).is_err());
    }

    #[test]
    fn response_shape() {
        let body = serde_json::to_value(EmbedResponse {
            embeddings: vec![vec![0.5, 0.25]],
        })
        .unwrap();
        assert_eq!(body, json!({ "embeddings": [[0.5, 0.25]] }));
    }
}
