use std::collections::BTreeMap;

use validator::ValidationErrors;

/// Messages to show next to the fields of a rejected form.
#[derive(Debug, Default)]
pub struct FormErrors {
	fields: BTreeMap<String, Vec<String>>,
	/// Messages that do not belong to a single field.
	general: Vec<String>,
}

impl FormErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// A form rejected as a whole, e.g. a failed login.
	pub fn general(message: impl Into<String>) -> Self {
		Self {
			general: vec![message.into()],
			..Self::default()
		}
	}

	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.fields
			.entry(field.to_owned())
			.or_default()
			.push(message.into());
	}

	pub fn field(&self, field: &str) -> &[String] {
		self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn non_field(&self) -> &[String] {
		&self.general
	}
}

impl From<ValidationErrors> for FormErrors {
	fn from(errors: ValidationErrors) -> Self {
		let mut form = Self::new();

		for (field, errors) in errors.field_errors() {
			for error in errors {
				let message = error
					.message
					.as_ref()
					.map_or_else(|| format!("Invalid value ({}).", error.code), ToString::to_string);

				form.add(&field, message);
			}
		}

		form
	}
}

#[cfg(test)]
mod test {
	use validator::ValidationError;

	use super::*;

	#[test]
	fn test_from_validation_errors() {
		let mut errors = ValidationErrors::new();
		let mut error = ValidationError::new("length");
		error.message = Some("Too long.".into());

		errors.add("title", error);
		errors.add("text", ValidationError::new("required"));

		let form = FormErrors::from(errors);

		assert_eq!(form.field("title"), ["Too long."]);
		assert_eq!(form.field("text"), ["Invalid value (required)."]);
		assert!(form.field("author").is_empty());
		assert!(form.non_field().is_empty());
	}

	#[test]
	fn test_general() {
		let form = FormErrors::general("Nope.");

		assert_eq!(form.non_field(), ["Nope."]);
		assert!(form.field("username").is_empty());
	}
}
