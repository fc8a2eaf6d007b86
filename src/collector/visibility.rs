use crate::collection::Visibility;

/// What an explicit privacy call refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Instance,
    Singleton,
    Constant,
}

#[derive(Debug)]
struct Explicit {
    frame: usize,
    name: String,
    target: Target,
    visibility: Visibility,
}

/// Tracks `private`/`protected`/`public` per class or module body
///
/// Each body is a frame with its own default visibility. Privacy calls
/// naming definitions are recorded and applied once the file is done, since
/// `private :foo` may come before or after `def foo`.
#[derive(Debug)]
pub struct VisibilityTracker {
    frames: Vec<(usize, Visibility)>,
    next: usize,
    explicit: Vec<Explicit>,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self {
            frames: vec![(0, Visibility::Public)],
            next: 1,
            explicit: Vec::new(),
        }
    }

    pub fn push(&mut self) {
        self.frames.push((self.next, Visibility::Public));
        self.next += 1;
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Id of the innermost class or module body
    pub fn frame(&self) -> usize {
        self.frames.last().map_or(0, |(id, _)| *id)
    }

    pub fn current(&self) -> Visibility {
        self.frames.last().map_or(Visibility::Public, |(_, v)| *v)
    }

    pub fn set_default(&mut self, visibility: Visibility) {
        if let Some(frame) = self.frames.last_mut() {
            frame.1 = visibility;
        }
    }

    pub fn declare(&mut self, name: &str, target: Target, visibility: Visibility) {
        self.explicit.push(Explicit {
            frame: self.frame(),
            name: name.to_string(),
            target,
            visibility,
        });
    }

    /// Explicitly declared visibility; the last declaration wins
    pub fn resolve(&self, frame: usize, name: &str, target: Target) -> Option<Visibility> {
        self.explicit
            .iter()
            .rev()
            .find(|e| e.frame == frame && e.target == target && e.name == name)
            .map(|e| e.visibility)
    }
}
