//! Fixed instruction templates for the text-generation backend.

/// Instruction for a privacy policy covering third-party phone verification.
pub fn policy_prompt(company_name: &str, website_url: &str) -> String {
    format!(
        "Generate a modern, professional, and compliant Privacy Policy for a company named \
         \"{company_name}\" with the website \"{website_url}\". This company uses Phone.email for \
         phone number verification. The policy should specifically mention how phone numbers are \
         handled via third-party verification and comply with standard GDPR/CCPA guidelines. \
         Format the response as a clean Markdown string."
    )
}

/// Instruction asking for a non-technical explanation of a completed verification.
pub fn insight_prompt(result_url: &str) -> String {
    format!(
        "A user has just verified their phone number via a service that returns this JSON \
         endpoint: {result_url}. Explain to a non-technical user why this is more secure than \
         traditional password-based authentication or email verification. Mention \"OTP-less\" \
         benefits and data integrity. Keep it concise and professional."
    )
}
