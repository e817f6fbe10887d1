//! Terminal rendering of banners.

use std::collections::HashMap;
use std::io::Write;

use tracing::warn;

use herald_core::surface::Banner;
use herald_core::Surface;

/// Prints banner changes as lines on a writer.
///
/// The kind is recovered from the class name's last `-` segment to pick a
/// colour; anything else is printed plain.
pub struct TerminalSurface<W: Write> {
    out: W,
    container: String,
    next_id: u64,
    elements: HashMap<u64, Banner>,
    color: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, container: impl Into<String>, color: bool) -> Self {
        Self {
            out,
            container: container.into(),
            next_id: 0,
            elements: HashMap::new(),
            color,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, banner: &Banner) -> String {
        let code = match banner.class_name.rsplit('-').next() {
            Some("failure") => "31",
            Some("delay") => "33",
            _ => "0",
        };
        if self.color {
            format!("\x1b[{code}m{}\x1b[0m", banner.text)
        } else {
            banner.text.clone()
        }
    }

    fn emit(&mut self, line: String) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            warn!("Failed to render banner: {e}");
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    type Handle = u64;

    fn create_element(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.insert(id, Banner::default());
        id
    }

    fn set_class(&mut self, handle: &u64, class_name: &str) {
        if let Some(banner) = self.elements.get_mut(handle) {
            banner.class_name = class_name.to_string();
        }
    }

    fn set_text(&mut self, handle: &u64, text: &str) {
        if let Some(banner) = self.elements.get_mut(handle) {
            banner.text = text.to_string();
        }
    }

    fn append(&mut self, handle: &u64) {
        let Some(banner) = self.elements.get(handle) else {
            return;
        };
        let line = format!("[{}] {} <{}>", self.container, self.paint(banner), banner.class_name);
        self.emit(line);
    }

    fn remove(&mut self, handle: u64) {
        if self.elements.remove(&handle).is_some() {
            let line = format!("[{}] (cleared)", self.container);
            self.emit(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_append_and_remove() {
        let mut surface = TerminalSurface::new(Vec::new(), "body", false);
        let id = surface.create_element();
        surface.set_class(&id, "status-report status-report-failure");
        surface.set_text(&id, "net down");
        surface.append(&id);
        surface.remove(id);

        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert_eq!(
            out,
            "[body] net down <status-report status-report-failure>\n[body] (cleared)\n"
        );
    }

    #[test]
    fn colours_by_kind() {
        let mut surface = TerminalSurface::new(Vec::new(), "body", true);
        let id = surface.create_element();
        surface.set_class(&id, "x x-delay");
        surface.set_text(&id, "slow");
        surface.append(&id);
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.contains("\x1b[33mslow\x1b[0m"));
    }
}
