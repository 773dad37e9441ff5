//! Agent card builders for both roles.

use serde_json::json;
use shopeval_lib::protocol::{AgentCard, AgentSkill};

/// Card for the controller agent.
pub fn green_card(name: &str, url: &str) -> AgentCard {
    AgentCard {
        name: name.to_string(),
        description: "WebShop assessor: instantiates the environment and evaluates a solver agent"
            .to_string(),
        url: url.to_string(),
        version: "0.1.0".to_string(),
        default_input_modes: vec!["text/plain".to_string()],
        default_output_modes: vec!["text/plain".to_string()],
        capabilities: json!({}),
        skills: vec![AgentSkill {
            id: "webshop_assessment".to_string(),
            name: "WebShop Assessment".to_string(),
            description: "Runs a bounded shopping episode against a solver agent".to_string(),
            tags: vec!["evaluation".to_string()],
            examples: vec![],
        }],
    }
}

/// Card for the solver agent.
pub fn white_card(name: &str, url: &str) -> AgentCard {
    AgentCard {
        name: name.to_string(),
        description: "Test agent for WebShop".to_string(),
        url: url.to_string(),
        version: "1.0.0".to_string(),
        default_input_modes: vec!["text/plain".to_string()],
        default_output_modes: vec!["text/plain".to_string()],
        capabilities: json!({}),
        skills: vec![AgentSkill {
            id: "shopping_fulfillment".to_string(),
            name: "Shopping Fulfillment".to_string(),
            description: "Handles shopping requests".to_string(),
            tags: vec!["general".to_string()],
            examples: vec![],
        }],
    }
}
