use crate::core::capability::FeatureId;

pub fn feature_table() -> String {
    let mut table = String::from("| Feature | Capabilities | Description |\n|---|---|---|\n");
    for feature in FeatureId::ALL {
        let capabilities = feature.capabilities();
        let capabilities = if capabilities.is_empty() {
            "(template)".to_string()
        } else {
            capabilities
                .iter()
                .map(|capability| capability.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            feature,
            capabilities,
            feature.description()
        ));
    }
    table
}

pub fn list_features() {
    println!("Available Features:\n");
    print!("{}", feature_table());
}
