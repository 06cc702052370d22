//! Input validation for API requests.
//!
//! Validators return a human-readable message on failure; handlers wrap the
//! message in an `ApiError`. Presence checks ("Missing fields") live in the
//! handlers since they cover several fields at once.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)+$"
    ).unwrap();
}

/// Validate an email address format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a product title
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.len() > 200 {
        return Err("Title is too long (max 200 characters)".to_string());
    }

    Ok(())
}

/// Validate a product description
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.len() > 5000 {
        return Err("Description is too long (max 5000 characters)".to_string());
    }

    Ok(())
}

/// Validate an image URL (optional field)
pub fn validate_image_url(image_url: &Option<String>) -> Result<(), String> {
    if let Some(url) = image_url {
        if url.len() > 2048 {
            return Err("Image URL is too long (max 2048 characters)".to_string());
        }
    }

    Ok(())
}

/// Validate a starting bid
pub fn validate_starting_bid(starting_bid: f64) -> Result<(), String> {
    if !starting_bid.is_finite() || starting_bid <= 0.0 {
        return Err("Starting bid must be a positive number".to_string());
    }

    Ok(())
}

/// Validate a bid amount
pub fn validate_bid_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err("Invalid bid amount".to_string());
    }

    Ok(())
}

/// Parse and validate a product id path parameter
pub fn parse_product_id(id: &str) -> Result<i64, String> {
    id.parse::<i64>()
        .map_err(|_| "Invalid product id".to_string())
}
