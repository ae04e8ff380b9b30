//! Random test-data generation for registration flows.

use harness::config::NewUserTemplate;
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
	"James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David", "Elizabeth", "William",
	"Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah", "Daniel", "Karen",
];

const LAST_NAMES: &[&str] = &[
	"Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez", "Martinez",
	"Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Martin",
];

const STREET_NAMES: &[&str] = &[
	"Main", "Oak", "Pine", "Maple", "Cedar", "Elm", "Washington", "Lake", "Hill", "Park",
];

const STREET_SUFFIXES: &[&str] = &["St", "Ave", "Blvd", "Dr", "Ln"];

const CITIES: &[&str] = &[
	"Austin", "Denver", "Portland", "Madison", "Raleigh", "Boise", "Savannah", "Tucson", "Omaha", "Richmond",
];

const STATES: &[&str] = &["TX", "CO", "OR", "WI", "NC", "ID", "GA", "AZ", "NE", "VA"];

const SPECIAL_CHARS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

pub fn first_name() -> String {
	pick(FIRST_NAMES)
}

pub fn last_name() -> String {
	pick(LAST_NAMES)
}

pub fn email() -> String {
	format!("{}@example.com", unique_username("user"))
}

/// Password with at least one lowercase, uppercase, digit, and (optionally)
/// special character, shuffled.
pub fn password(length: usize, include_special: bool) -> String {
	let mut rng = rand::thread_rng();
	let mut classes: Vec<&[u8]> = vec![b"abcdefghijklmnopqrstuvwxyz", b"ABCDEFGHIJKLMNOPQRSTUVWXYZ", b"0123456789"];
	if include_special {
		classes.push(SPECIAL_CHARS);
	}

	let mut chars: Vec<u8> = classes
		.iter()
		.map(|class| class[rng.gen_range(0..class.len())])
		.collect();
	while chars.len() < length.max(classes.len()) {
		let class = classes[rng.gen_range(0..classes.len())];
		chars.push(class[rng.gen_range(0..class.len())]);
	}
	chars.shuffle(&mut rng);
	String::from_utf8(chars).unwrap_or_else(|_| "Password1!".to_owned())
}

pub fn phone_number() -> String {
	let mut rng = rand::thread_rng();
	format!("555-{:03}-{:04}", rng.gen_range(100..1000), rng.gen_range(0..10_000))
}

pub fn street_address() -> String {
	let mut rng = rand::thread_rng();
	format!("{} {} {}", rng.gen_range(1..10_000), pick(STREET_NAMES), pick(STREET_SUFFIXES))
}

pub fn city() -> String {
	pick(CITIES)
}

pub fn state() -> String {
	pick(STATES)
}

pub fn zip_code() -> String {
	format!("{:05}", rand::thread_rng().gen_range(0..100_000))
}

/// Nine random digits, the shape ParaBank accepts for an SSN.
pub fn ssn() -> String {
	let mut rng = rand::thread_rng();
	(0..9).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

/// `<prefix>_<8 hex chars>`, unique per call.
pub fn unique_username(prefix: &str) -> String {
	let id = Uuid::new_v4().simple().to_string();
	format!("{prefix}_{}", &id[..8])
}

/// A complete registration record.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub first_name: String,
	pub last_name: String,
	pub address: String,
	pub city: String,
	pub state: String,
	pub zip_code: String,
	pub phone: String,
	pub ssn: String,
	pub username: String,
	pub password: String,
}

impl NewUser {
	pub fn generate() -> Self {
		Self {
			first_name: first_name(),
			last_name: last_name(),
			address: street_address(),
			city: city(),
			state: state(),
			zip_code: zip_code(),
			phone: phone_number(),
			ssn: ssn(),
			username: unique_username("testuser"),
			password: password(12, true),
		}
	}

	/// Template data from configuration plus a fresh unique username.
	pub fn from_template(template: &NewUserTemplate) -> Self {
		Self {
			first_name: template.first_name.clone(),
			last_name: template.last_name.clone(),
			address: template.address.clone(),
			city: template.city.clone(),
			state: template.state.clone(),
			zip_code: template.zip_code.clone(),
			phone: template.phone.clone(),
			ssn: template.ssn.clone(),
			username: unique_username("testuser"),
			password: template.password.clone(),
		}
	}
}

fn pick(values: &[&str]) -> String {
	values
		.choose(&mut rand::thread_rng())
		.copied()
		.unwrap_or_default()
		.to_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn password_contains_every_required_class() {
		let password = password(12, true);
		assert_eq!(password.len(), 12);
		assert!(password.chars().any(|c| c.is_ascii_lowercase()));
		assert!(password.chars().any(|c| c.is_ascii_uppercase()));
		assert!(password.chars().any(|c| c.is_ascii_digit()));
		assert!(password.chars().any(|c| !c.is_ascii_alphanumeric()));
	}

	#[test]
	fn password_without_special_chars_stays_alphanumeric() {
		let password = password(16, false);
		assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
	}

	#[test]
	fn ssn_is_nine_digits() {
		let ssn = ssn();
		assert_eq!(ssn.len(), 9);
		assert!(ssn.chars().all(|c| c.is_ascii_digit()));
	}

	#[test]
	fn usernames_are_unique_across_calls() {
		let a = unique_username("testuser");
		let b = unique_username("testuser");
		assert_ne!(a, b);
		assert!(a.starts_with("testuser_"));
	}

	#[test]
	fn generated_user_has_no_empty_fields() {
		let user = NewUser::generate();
		for field in [
			&user.first_name,
			&user.last_name,
			&user.address,
			&user.city,
			&user.state,
			&user.zip_code,
			&user.phone,
			&user.ssn,
			&user.username,
			&user.password,
		] {
			assert!(!field.is_empty());
		}
	}
}
