pub fn build_classification_prompt(query: &str) -> String {
    format!(
        r#"Classify the following business-intelligence query about a company.

INSTRUCTIONS:
1. Decide what the query is about (query_type)
2. Decide which analysis should answer it (analysis_type)
3. Output ONLY valid JSON, nothing else

SCHEMA:
{{"query_type": "company|person|relationship|custom", "analysis_type": "general|risk_comparison|supplier_analysis"}}

RULES:
- risk, compliance or sanctions questions use "risk_comparison"
- supplier, supply chain or relationship questions use "supplier_analysis"
- everything else uses "general"
- The query may be in English or Czech
- Output ONLY the JSON object, no markdown, no explanations

QUERY:
{}

JSON OUTPUT:"#,
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_query() {
        let prompt = build_classification_prompt("Tell me about MB TOOL");
        assert!(prompt.contains("Tell me about MB TOOL"));
        assert!(prompt.contains("risk_comparison"));
    }
}
