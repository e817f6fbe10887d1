//! Host display surface.
//!
//! The reporter needs very little from its host: create an element, give it a
//! class and some text, attach it to a fixed container and later remove it.
//! [`MemorySurface`] is the in-process implementation used by the simulator
//! and tests; other hosts (a terminal, a web document) implement [`Surface`]
//! themselves.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Append/remove capability on a fixed container.
pub trait Surface {
    /// Owned reference to one element. Consumed by [`Surface::remove`].
    type Handle;

    fn create_element(&mut self) -> Self::Handle;

    fn set_class(&mut self, handle: &Self::Handle, class_name: &str);

    fn set_text(&mut self, handle: &Self::Handle, text: &str);

    /// Attaches the element as a child of the container.
    fn append(&mut self, handle: &Self::Handle);

    /// Detaches the element and releases it.
    fn remove(&mut self, handle: Self::Handle);
}

/// Identifier of an element created by a [`MemorySurface`].
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

impl ElementId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Visible content of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub class_name: String,
    pub text: String,
}

/// Operations applied to a [`MemorySurface`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Append { id: u64, class_name: String, text: String },
    Remove { id: u64 },
}

impl fmt::Display for SurfaceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceOp::Append { id, class_name, text } => {
                write!(f, "append #{id} [{class_name}] {text}")
            }
            SurfaceOp::Remove { id } => write!(f, "remove #{id}"),
        }
    }
}

/// In-memory container.
#[derive(Debug, Default)]
pub struct MemorySurface {
    next_id: u64,
    elements: BTreeMap<u64, Banner>,
    attached: Vec<u64>,
    log: Vec<SurfaceOp>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Banners currently attached, in attachment order.
    pub fn attached(&self) -> Vec<Banner> {
        self.attached
            .iter()
            .filter_map(|id| self.elements.get(id).cloned())
            .collect()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// The only attached banner, if exactly one is attached.
    pub fn single_banner(&self) -> Option<Banner> {
        match self.attached.as_slice() {
            [id] => self.elements.get(id).cloned(),
            _ => None,
        }
    }

    pub fn log(&self) -> &[SurfaceOp] {
        &self.log
    }

    pub fn into_shared(self) -> SharedSurface {
        SharedSurface(Arc::new(Mutex::new(self)))
    }
}

impl Surface for MemorySurface {
    type Handle = ElementId;

    fn create_element(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.insert(id, Banner::default());
        ElementId(id)
    }

    fn set_class(&mut self, handle: &ElementId, class_name: &str) {
        if let Some(banner) = self.elements.get_mut(&handle.0) {
            banner.class_name = class_name.to_string();
        }
    }

    fn set_text(&mut self, handle: &ElementId, text: &str) {
        if let Some(banner) = self.elements.get_mut(&handle.0) {
            banner.text = text.to_string();
        }
    }

    fn append(&mut self, handle: &ElementId) {
        if self.attached.contains(&handle.0) {
            return;
        }
        if let Some(banner) = self.elements.get(&handle.0) {
            self.log.push(SurfaceOp::Append {
                id: handle.0,
                class_name: banner.class_name.clone(),
                text: banner.text.clone(),
            });
            self.attached.push(handle.0);
        }
    }

    fn remove(&mut self, handle: ElementId) {
        self.elements.remove(&handle.0);
        if let Some(pos) = self.attached.iter().position(|id| *id == handle.0) {
            self.attached.remove(pos);
            self.log.push(SurfaceOp::Remove { id: handle.0 });
        }
    }
}

/// A [`MemorySurface`] that can be inspected while a reporter owns a clone.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface(Arc<Mutex<MemorySurface>>);

impl SharedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> Vec<Banner> {
        self.0.lock().attached()
    }

    pub fn single_banner(&self) -> Option<Banner> {
        self.0.lock().single_banner()
    }

    pub fn attached_count(&self) -> usize {
        self.0.lock().attached_count()
    }

    pub fn log(&self) -> Vec<SurfaceOp> {
        self.0.lock().log().to_vec()
    }
}

impl Surface for SharedSurface {
    type Handle = ElementId;

    fn create_element(&mut self) -> ElementId {
        self.0.lock().create_element()
    }

    fn set_class(&mut self, handle: &ElementId, class_name: &str) {
        self.0.lock().set_class(handle, class_name)
    }

    fn set_text(&mut self, handle: &ElementId, text: &str) {
        self.0.lock().set_text(handle, text)
    }

    fn append(&mut self, handle: &ElementId) {
        self.0.lock().append(handle)
    }

    fn remove(&mut self, handle: ElementId) {
        self.0.lock().remove(handle)
    }
}
