// Prompt templates

use leadgen_core::LeadRequest;

/// Strategy prompt. Answered in JSON mode, so the whole body is the object.
pub fn strategy_prompt(problem: &str) -> String {
    format!(
        r#"Analyze the following business problem and generate a concise lead generation strategy.
Problem: "{problem}"

Based on this, identify:
1. The ideal type of business to target (businessType).
2. A list of 3-5 specific cities or regions that would be good starting points (locations).
3. One or two key requirements or characteristics these businesses should have (requirements).

Return the response as a single, valid JSON object with the keys "businessType", "locations" (an array of strings), and "requirements".
Example response: {{"businessType": "High-end Coffee Shops", "locations": ["San Francisco, CA", "Seattle, WA", "Portland, OR"], "requirements": "offers oat milk and free wifi"}}"#,
        problem = problem.trim()
    )
}

/// Lead prompt. Maps grounding rules out JSON mode, so the array is
/// extracted from free text afterwards.
pub fn leads_prompt(request: &LeadRequest, request_coordinates: bool) -> String {
    let mut prompt = format!(
        "Generate a detailed list of up to {} of the best matching \"{}\" in {}.",
        request.count, request.business_type, request.location
    );

    if let Some(requirements) = &request.requirements {
        prompt.push_str(&format!(
            " Strictly prioritize businesses that meet these criteria: \"{}\".",
            requirements
        ));
    }

    prompt.push_str(
        " For each business, provide its name, specific category, full address, phone number, website URL, \
         Google Maps rating (as a number from 1-5), the total count of reviews (as a number), \
         and typical opening hours (as a string like \"Mon-Fri 9am-5pm\")",
    );
    if request_coordinates {
        prompt.push_str(", plus its latitude and longitude (as decimal degrees)");
    }
    prompt.push('.');

    let keys = if request_coordinates {
        r#""name", "category", "address", "phone", "website", "rating", "reviewsCount", "openingHours", "latitude", "longitude""#
    } else {
        r#""name", "category", "address", "phone", "website", "rating", "reviewsCount", "openingHours""#
    };
    prompt.push_str(&format!(
        " Return the response as a single, valid JSON array of objects. Each object must have the following keys: {}. \
         If a piece of information is not available, use null for that key. \
         Do not include any businesses that do not fit the requested business type.",
        keys
    ));

    prompt
}

/// Verification prompt. Search grounding is on, so the object is extracted
/// from free text.
pub fn verification_prompt(business_name: &str, website_url: &str, requirement: &str) -> String {
    format!(
        r#"Check whether the business "{name}" (website: {url}) meets this requirement: "{requirement}".
Use the business website and other public information about this business.
Also find the most relevant page on the website for contacting the business or applying (for example a contact, booking, partnership or application page).

Return the response as a single, valid JSON object with the keys:
"meetsRequirement" (boolean),
"justification" (a short explanation of at most 25 words),
"applicationUrl" (the URL of that contact or application page as a string, or null if none was found)."#,
        name = business_name.trim(),
        url = website_url.trim(),
        requirement = requirement.trim()
    )
}
