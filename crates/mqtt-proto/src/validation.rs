use core::fmt;
use semval::{Invalidity, Validate, context::Context};

#[cfg(feature = "spantrace")]
use tracing_error::SpanTrace;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

/// A failed validation of a discovery document, together with every
/// invalidity that was found.
#[derive(Debug)]
pub struct ValidationError<I: Invalidity + Send + Sync> {
	invalidities: Vec<I>,
	#[cfg(feature = "backtrace")]
	backtrace: Backtrace,
	#[cfg(feature = "spantrace")]
	spantrace: SpanTrace,
}

impl<I: Invalidity + Send + Sync> ValidationError<I> {
	pub fn new(invalidities: impl IntoIterator<Item = I>) -> Self {
		Self {
			invalidities: invalidities.into_iter().collect(),
			#[cfg(feature = "backtrace")]
			backtrace: Backtrace::capture(),
			#[cfg(feature = "spantrace")]
			spantrace: SpanTrace::capture(),
		}
	}

	pub fn invalidities(&self) -> &[I] {
		&self.invalidities
	}

	pub fn into_invalidities(self) -> Vec<I> {
		self.invalidities
	}

	#[cfg(feature = "backtrace")]
	#[cfg_attr(doc_cfg, doc(cfg(feature = "backtrace")))]
	pub fn backtrace(&self) -> &Backtrace {
		&self.backtrace
	}

	#[cfg(feature = "spantrace")]
	#[cfg_attr(doc_cfg, doc(cfg(feature = "spantrace")))]
	pub fn spantrace(&self) -> &SpanTrace {
		&self.spantrace
	}
}

impl<I: Invalidity + Send + Sync> fmt::Display for ValidationError<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "validation error: {:?}", &self.invalidities)
	}
}

impl<I: Invalidity + Send + Sync> std::error::Error for ValidationError<I> {}

/// Validate a document and turn the semval context into a [ValidationError].
pub trait ValidateExt: Validate
where
	Self::Invalidity: Send + Sync,
{
	fn validated(&self) -> Result<&Self, ValidationError<Self::Invalidity>> {
		match self.validate() {
			Ok(()) => Ok(self),
			Err(context) => Err(ValidationError::new(context)),
		}
	}
}

impl<T> ValidateExt for T
where
	T: Validate + ?Sized,
	T::Invalidity: Send + Sync,
{
}

pub(crate) trait ValidateContextExt {
	type Invalidity: Invalidity;

	/// Validate the target and merge the mapped result into this context if the target is not `None`.
	fn validate_with_opt<F, U>(self, target: &Option<impl Validate<Invalidity = U>>, map: F) -> Self
	where
		F: Fn(U) -> Self::Invalidity,
		U: Invalidity;

	/// Validate all items in an iterator.
	fn validate_iter<'a, F, U, I, II: 'a>(self, target: I, map: F) -> Self
	where
		F: Fn(usize, U) -> Self::Invalidity,
		U: Invalidity,
		I: IntoIterator<Item = &'a II>,
		II: Validate<Invalidity = U>;
}

impl<V: Invalidity> ValidateContextExt for Context<V> {
	type Invalidity = V;

	#[inline]
	fn validate_with_opt<F, U>(self, target: &Option<impl Validate<Invalidity = U>>, map: F) -> Self
	where
		F: Fn(U) -> Self::Invalidity,
		U: Invalidity,
	{
		match target {
			Some(v) => self.validate_with(v, map),
			None => self,
		}
	}

	fn validate_iter<'a, F, U, I, II: 'a>(self, target: I, map: F) -> Self
	where
		F: Fn(usize, U) -> Self::Invalidity,
		U: Invalidity,
		I: IntoIterator<Item = &'a II>,
		II: Validate<Invalidity = U>,
	{
		target
			.into_iter()
			.enumerate()
			.fold(self, |context, (index, item)| {
				context.validate_with(item, |v| map(index, v))
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Topic, topic::TopicInvalidity};

	#[test]
	fn validated_returns_document_when_valid() {
		let topic = Topic::from("airbolt/default/available");
		let validated = topic.validated().expect("should be valid");
		assert_eq!(validated.as_str(), "airbolt/default/available");
	}

	#[test]
	fn validated_collects_every_invalidity() {
		let err = Topic::from("").validated().expect_err("should be invalid");
		assert_eq!(err.invalidities(), &[TopicInvalidity::Empty]);
		assert!(err.to_string().starts_with("validation error"));
	}
}
