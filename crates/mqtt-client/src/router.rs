use std::{
	collections::{BTreeMap, HashMap},
	rc::Rc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct RouteId(u64);

#[derive(Debug)]
struct Node<T> {
	route: Rc<str>,
	value: T,
}

/// Exact-topic router. Several handlers may share a topic; the topic is
/// handed back when its last handler is removed so the caller can
/// unsubscribe from it.
#[derive(Debug)]
pub(crate) struct Router<T> {
	next_id: u64,
	nodes: HashMap<RouteId, Node<T>>,
	routes: BTreeMap<Rc<str>, Vec<RouteId>>,
}

impl<T> Default for Router<T> {
	fn default() -> Self {
		Self {
			next_id: 0,
			nodes: HashMap::new(),
			routes: BTreeMap::new(),
		}
	}
}

impl<T> Router<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the id of the new route, and whether it is the first route for
	/// the topic.
	pub fn insert(&mut self, route: &str, value: T) -> (RouteId, bool) {
		let id = RouteId(self.next_id);
		self.next_id += 1;

		let route: Rc<str> = match self.routes.get_key_value(route) {
			Some((existing, _)) => Rc::clone(existing),
			None => Rc::from(route),
		};

		let ids = self.routes.entry(Rc::clone(&route)).or_default();
		let first = ids.is_empty();
		ids.push(id);
		self.nodes.insert(id, Node { route, value });
		(id, first)
	}

	/// Removes a route. The second element is the topic if no routes remain
	/// for it.
	pub fn remove(&mut self, id: RouteId) -> Option<(T, Option<Rc<str>>)> {
		let node = self.nodes.remove(&id)?;
		let ids = self.routes.get_mut(&node.route)?;
		if let Some(index) = ids.iter().position(|i| *i == id) {
			ids.swap_remove(index);
		}

		if ids.is_empty() {
			self.routes.remove(&node.route);
			Some((node.value, Some(node.route)))
		} else {
			Some((node.value, None))
		}
	}

	pub fn matches<'a>(
		&'a self,
		topic: &str,
	) -> impl ExactSizeIterator<Item = (RouteId, &'a T)> + use<'a, T> {
		let ids: &[RouteId] = match self.routes.get(topic) {
			Some(ids) => ids,
			None => &[],
		};

		ids.iter().map(|id| (*id, &self.nodes[id].value))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn routes_by_exact_topic() {
		let mut router = Router::new();
		let (r1, first1) = router.insert("homeassistant/status", 1);
		let (r2, first2) = router.insert("airbolt/default/abc/state", 2);
		let (r3, first3) = router.insert("homeassistant/status", 3);
		assert!(first1 && first2 && !first3);

		assert_eq!(
			router
				.matches("homeassistant/status")
				.map(|(_, v)| *v)
				.collect::<Vec<_>>(),
			vec![1, 3]
		);
		assert_eq!(router.matches("homeassistant/+").len(), 0);

		assert_eq!(router.remove(r1), Some((1, None)));
		assert_eq!(
			router.remove(r3),
			Some((3, Some("homeassistant/status".into())))
		);
		assert_eq!(
			router.remove(r2),
			Some((2, Some("airbolt/default/abc/state".into())))
		);
		assert_eq!(router.remove(r2), None);
	}
}
