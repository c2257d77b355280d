/// Upper-case the first letter of every run of letters and lower-case the rest.
///
/// Anything that is not a letter separates words, so `shield gps` becomes
/// `Shield Gps` while `batteryLife` becomes `Batterylife`.
pub fn title_case(value: &str) -> String {
	let mut result = String::with_capacity(value.len());
	let mut in_word = false;

	for c in value.chars() {
		if c.is_alphabetic() {
			if in_word {
				result.extend(c.to_lowercase());
			} else {
				result.extend(c.to_uppercase());
			}

			in_word = true;
		} else {
			result.push(c);
			in_word = false;
		}
	}

	result
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn words_are_capitalized() {
		assert_eq!(title_case("shield gps"), "Shield Gps");
		assert_eq!(title_case("responsiveness"), "Responsiveness");
	}

	#[test]
	fn inner_capitals_are_lowered() {
		assert_eq!(title_case("batteryLife"), "Batterylife");
		assert_eq!(title_case("SOS"), "Sos");
	}

	#[test]
	fn digits_split_words() {
		assert_eq!(title_case("gen2gps"), "Gen2Gps");
		assert_eq!(title_case(""), "");
	}
}
