//! Prompt templates for the two gateway operations.

/// The profile schema the extraction prompt asks the model to follow.
/// Unknown fields stay as `"..."`; the store accepts any JSON object, so
/// this is a convention, not a validated contract.
pub const PROFILE_SCHEMA: &str = r#"{
  "personal": {
    "firstName": "...",
    "lastName": "...",
    "fullName": "...",
    "email": "...",
    "phone": "...",
    "dateOfBirth": "...",
    "nationality": "...",
    "address": {
      "street": "...",
      "city": "...",
      "state": "...",
      "zipCode": "...",
      "country": "..."
    },
    "summary": "...",
    "bio": "..."
  },
  "professional": {
    "currentTitle": "...",
    "experience": [
      {
        "company": "...",
        "position": "...",
        "startDate": "...",
        "endDate": "...",
        "description": "...",
        "technologies": ["..."],
        "achievements": ["..."]
      }
    ],
    "skills": {
      "technical": ["..."],
      "soft": ["..."],
      "languages": ["..."],
      "frameworks": ["..."],
      "tools": ["..."]
    },
    "salaryExpectation": "...",
    "availabilityDate": "..."
  },
  "education": [
    {
      "institution": "...",
      "degree": "...",
      "field": "...",
      "startYear": "...",
      "endYear": "...",
      "gpa": "...",
      "honors": "...",
      "thesis": "..."
    }
  ],
  "projects": [
    {
      "name": "...",
      "description": "...",
      "role": "...",
      "technologies": ["..."],
      "duration": "...",
      "outcome": "...",
      "url": "..."
    }
  ],
  "research": {
    "publications": [
      {
        "title": "...",
        "authors": ["..."],
        "journal": "...",
        "year": "...",
        "doi": "..."
      }
    ],
    "patents": ["..."],
    "conferences": ["..."],
    "grants": ["..."]
  },
  "additional": {
    "certifications": [
      {
        "name": "...",
        "issuer": "...",
        "date": "...",
        "expiryDate": "..."
      }
    ],
    "languages": [
      {
        "language": "...",
        "level": "..."
      }
    ],
    "hobbies": ["..."],
    "volunteering": ["..."],
    "awards": ["..."]
  },
  "documents": {
    "portfolio": "...",
    "linkedin": "...",
    "github": "...",
    "website": "...",
    "resume": "...",
    "coverLetter": "..."
  }
}"#;

/// System prompt for turning raw document text into a structured profile.
pub fn extract_profile_prompt() -> String {
    format!(
        r#"You are DataExtractor_v2, an expert at extracting structured information from various types of documents.

You will receive raw text from documents such as:
- Resumes/CVs
- Project descriptions
- Research papers
- Personal profiles
- Cover letters
- Academic transcripts
- Portfolio descriptions

Your task: Extract relevant information and organize it according to the provided schema.

IMPORTANT RULES:
1. Only include information that is explicitly stated or clearly implied in the text
2. Use "..." for any fields where no information is available
3. For arrays, include all relevant items found in the text
4. For dates, use consistent formats (YYYY-MM-DD or YYYY)
5. Be precise and avoid making assumptions

SCHEMA:
{PROFILE_SCHEMA}

Return ONLY a valid JSON object following this exact schema structure. Do not include any explanations or additional text.

RAW TEXT:
---
"#
    )
}

/// Strict autofill system prompt. The model may only answer with keys drawn
/// from `allowed_selectors`; anything else must be omitted.
pub fn autofill_prompt(allowed_selectors: &[String]) -> String {
    let allowed = allowed_selectors
        .iter()
        .map(|s| format!("  \"{s}\""))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are FormAutoFiller_v3, an expert at web form autofill using structured user profiles.

IMPORTANT: You MUST use ONLY the following selectors as keys for your output:
[
{allowed}
]
Do NOT add any other keys except the selectors listed above. If you do not have appropriate data for a selector, simply omit it from the response.

You will receive:
1. PAGE_CONTEXT: contains URL, title, and an array of form fields with descriptions
2. USER_PROFILE: a structured user profile
3. Optionally INSTRUCTIONS: session-specific directions from the user

Your task:
- For each form field, analyze its description and find the most appropriate data in USER_PROFILE
- When INSTRUCTIONS are present they OVERRIDE the profile: if an instruction conflicts with profile data, follow the instruction
- Return ONLY a JSON object where keys are selectors from the list above and values are the appropriate data
- Do NOT add any other keys
- If there is no suitable data, do not include the selector in the response

FIELD TYPE HANDLING:
- Text inputs (Type: text, email, tel, etc.): return the actual text value to fill in
- Dropdowns (Type: select): look for "Available options: [...]" in the description and return the EXACT option text that best matches
- Checkboxes (Type: checkbox): return "true" to check, "false" to uncheck
- Radio buttons (Type: radio): return "true" for the option that should be selected; only one option in a group gets "true"

Example response:
{{
  "input[name='firstName']": "Alexander",
  "input[name='email']": "sample@example.com",
  "select[name='experience-level']": "Senior"
}}

Return ONLY the JSON object, no additional text.

PAGE_CONTEXT and USER_PROFILE:
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_schema_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(PROFILE_SCHEMA).unwrap();
        assert!(value["personal"]["firstName"].is_string());
        assert!(value["education"].is_array());
    }

    #[test]
    fn test_extract_prompt_embeds_schema() {
        let prompt = extract_profile_prompt();
        assert!(prompt.contains("\"firstName\""));
        assert!(prompt.contains("RAW TEXT"));
    }

    #[test]
    fn test_autofill_prompt_lists_selectors() {
        let selectors = vec!["#email".to_string(), "input[name=\"firstName\"]".to_string()];
        let prompt = autofill_prompt(&selectors);
        assert!(prompt.contains("  \"#email\","));
        assert!(prompt.contains("  \"input[name=\"firstName\"]\""));
        assert!(prompt.contains("Do NOT add any other keys"));
    }

    #[test]
    fn test_autofill_prompt_empty_selector_list() {
        let prompt = autofill_prompt(&[]);
        assert!(prompt.contains("[\n\n]"));
    }
}
