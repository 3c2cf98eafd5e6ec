use serde::{Deserialize, Serialize};

/// Top-level layout of a methods file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct YmlSettings {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub methods: Vec<MethodSettings>,
}

/// One declared method
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct MethodSettings {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> YmlSettings {
        YmlSettings {
            prefix: "krosstalk".to_string(),
            methods: vec![
                MethodSettings {
                    name: "ping".to_string(),
                    endpoint: None,
                    arguments: vec![],
                },
                MethodSettings {
                    name: "doThing".to_string(),
                    endpoint: Some("{$prefix}/{$name}/a/{a}".to_string()),
                    arguments: vec!["a".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_serde() {
        let settings = settings();
        let yml = serde_yaml::to_string(&settings).unwrap();
        let deserde: YmlSettings = serde_yaml::from_str(&yml).unwrap();
        assert_eq!(settings, deserde);
    }

    #[test]
    fn test_skip_empty_fields_in_yaml() {
        let yml = serde_yaml::to_string(&settings().methods[0]).unwrap();

        assert!(!yml.contains("endpoint:"));
        assert!(!yml.contains("arguments:"));
        assert!(yml.contains("name:"));
    }

    #[test]
    fn test_defaults_when_missing() {
        let parsed: YmlSettings = serde_yaml::from_str("methods:\n  - name: ping\n").unwrap();
        assert_eq!(parsed.prefix, "");
        assert_eq!(parsed.methods[0].endpoint, None);
        assert!(parsed.methods[0].arguments.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&settings()).unwrap();
        assert!(json.contains("\"endpoint\""));
        let deserde: YmlSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings(), deserde);
    }
}
