/// Extract a JSON object from a response that might have markdown code blocks
/// or extra text around it.
pub(crate) fn extract_json(response: &str) -> &str {
    // Fenced ```json block
    if let Some(start) = response.find("```json") {
        if let Some(end) = response[start + 7..].find("```") {
            return response[start + 7..start + 7 + end].trim();
        }
    }

    // Plain fenced block, possibly with another language tag
    if let Some(start) = response.find("```") {
        if let Some(end) = response[start + 3..].find("```") {
            let content = response[start + 3..start + 3 + end].trim();
            if let Some(newline_pos) = content.find('\n') {
                if !content[..newline_pos].trim_start().starts_with('{') {
                    return content[newline_pos + 1..].trim();
                }
            }
            return content;
        }
    }

    // Raw object embedded in prose
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return &response[start..=end];
        }
    }

    response.trim()
}
