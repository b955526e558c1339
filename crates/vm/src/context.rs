use std::rc::Rc;

/// One native call in progress.
#[derive(Debug, Clone)]
pub struct Frame {
	pub method: Rc<str>,
}

/// Call stack of one execution context.
#[derive(Debug)]
pub struct Context {
	id: u64,
	frames: Vec<Frame>,
}

impl Context {
	pub(crate) fn new(id: u64) -> Self {
		Self { id, frames: Vec::new() }
	}

	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	pub fn frames(&self) -> &[Frame] {
		&self.frames
	}

	pub(crate) fn push(&mut self, method: Rc<str>) {
		self.frames.push(Frame { method });
	}

	pub(crate) fn pop(&mut self) {
		self.frames.pop();
	}

	pub(crate) fn truncate(&mut self, depth: usize) {
		self.frames.truncate(depth);
	}
}

/// Caller context parked while an isolated context runs.
#[derive(Debug)]
pub struct SavedContext(pub(crate) Context);
