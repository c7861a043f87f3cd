use serde::{Deserialize, Serialize};

/// Description of a page's interactive elements, as produced by the injected
/// script. Missing fields fall back to the same defaults the script applies,
/// so a hand-trimmed payload still parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub page: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub inputs: Vec<InputField>,
    #[serde(default)]
    pub buttons: Vec<ButtonField>,
    #[serde(default)]
    pub selects: Vec<SelectField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputField {
    #[serde(rename = "type", default = "default_input_type")]
    pub input_type: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonField {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "className", default)]
    pub class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectField {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_input_type() -> String {
    "text".to_string()
}

/// Parse a snapshot payload coming out of the page. The page is untrusted
/// content, so anything that does not decode into the expected shape is an
/// error the caller must surface instead of storing.
pub fn parse(raw: &str) -> Result<PageSnapshot, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_snapshot() {
        let raw = r#"{
  "page": 2,
  "title": "Login",
  "url": "https://example.com/login",
  "inputs": [
    {
      "type": "password",
      "placeholder": "Password",
      "name": "pw",
      "id": "pw",
      "value": ""
    }
  ],
  "buttons": [
    {
      "text": "Sign in",
      "id": "submit",
      "className": "btn btn-primary"
    }
  ],
  "selects": [
    {
      "name": "lang",
      "id": "",
      "options": ["English", "Português"]
    }
  ]
}"#;
        let snap = parse(raw).unwrap();
        assert_eq!(snap.page, 2);
        assert_eq!(snap.title, "Login");
        assert_eq!(snap.inputs.len(), 1);
        assert_eq!(snap.inputs[0].input_type, "password");
        assert_eq!(snap.buttons[0].class_name, "btn btn-primary");
        assert_eq!(snap.selects[0].options, ["English", "Português"]);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let snap = parse(r#"{"page": 1, "inputs": [{}], "buttons": [{}]}"#).unwrap();
        assert_eq!(snap.title, "");
        assert_eq!(snap.url, "");
        assert_eq!(snap.inputs[0].input_type, "text");
        assert_eq!(snap.inputs[0].placeholder, "");
        assert_eq!(snap.buttons[0].text, "");
        assert!(snap.selects.is_empty());
    }

    #[test]
    fn rejects_payloads_of_the_wrong_shape() {
        assert!(parse("[]").is_err());
        assert!(parse("\"just a string\"").is_err());
        assert!(parse(r#"{"title": "no page number"}"#).is_err());
        assert!(parse("{ not json").is_err());
    }
}
