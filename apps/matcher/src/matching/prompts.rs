// All LLM prompt constants for ideal-profile generation.

/// System instruction for ideal-profile generation.
pub const IDEAL_PROFILE_SYSTEM: &str = "You are an expert healthcare recruiter who knows \
    exactly what makes an ideal candidate for healthcare positions. \
    Generate realistic and detailed candidate profiles.";

/// Ideal-profile prompt template.
/// Replace: {title}, {employer}, {location}, {wage_band}, {description}, {requirements}
pub const IDEAL_PROFILE_PROMPT_TEMPLATE: &str = r#"Based on the following job posting, generate an ideal candidate resume/profile
that would be a perfect match for this position. Include relevant skills, experience,
education, and qualifications that would make someone an ideal candidate.

Job Title: {title}
Company: {employer}
Location: {location}
Salary Range: {wage_band}

Job Description:
{description}

Requirements:
{requirements}

Generate a comprehensive ideal candidate profile that includes:
1. Professional Summary
2. Key Skills and Competencies
3. Relevant Work Experience
4. Education and Certifications
5. Soft Skills and Work Style

Write this as if it were the text content of an actual resume, focusing on healthcare-specific
qualifications and experience that would make someone perfect for this role."#;

pub const MISSING_DESCRIPTION: &str = "Not specified.";
pub const MISSING_REQUIREMENTS: &str = "- No specific requirements listed";
