//! Edge triggered external interrupt lines.

use log::{debug, trace, warn};

use crate::callback::{Callback, CallbackRegistry, Mailbox, Source};
use crate::traits::ExtiController;

pub const LINE_COUNT: usize = 3;

// Declared in hardware priority order, highest first.
c_like_enum! {
  ExtiLine {
    Int0 = 0,
    Int1 = 1,
    Int2 = 2,
  }
}

impl Source for ExtiLine {
    fn index(self) -> usize {
        self as usize
    }
}

// Values are the ISCx1:ISCx0 bit pattern.
c_like_enum! {
  Edge {
    /// Any logical change.
    Toggle = 1,
    Falling = 2,
    Rising = 3,
  }
}

/// Mailbox for events posted from the external interrupt vectors.
pub type ExtiMailbox = Mailbox<ExtiLine, LINE_COUNT>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTriggerConfig {
    pub trigger: Edge,
    pub enabled: bool,
}

impl Default for EdgeTriggerConfig {
    fn default() -> Self {
        EdgeTriggerConfig {
            trigger: Edge::Falling,
            enabled: false,
        }
    }
}

/// The external interrupt lines, with one callback slot each.
///
/// `app` is state owned on behalf of the application. Callbacks get the whole
/// `ExternalInterrupts`, so that's where a flag for the foreground loop goes.
pub struct ExternalInterrupts<E, U = ()> {
    controller: E,
    lines: [EdgeTriggerConfig; LINE_COUNT],
    callbacks: CallbackRegistry<ExtiLine, ExternalInterrupts<E, U>, LINE_COUNT>,
    app: U,
}

impl<E: ExtiController, U> ExternalInterrupts<E, U> {
    pub fn new(controller: E, app: U) -> Self {
        Self {
            controller,
            lines: [EdgeTriggerConfig::default(); LINE_COUNT],
            callbacks: CallbackRegistry::new(),
            app,
        }
    }

    /// Selects the edge that fires `line`.
    ///
    /// The line must be disabled while its trigger changes: the hardware may
    /// raise a spurious interrupt otherwise. This is the caller's
    /// responsibility; doing it anyway is logged and then carried out.
    pub fn set_trigger(&mut self, line: ExtiLine, edge: Edge) {
        let config = &mut self.lines[line.index()];
        if config.enabled {
            warn!("Changing {:?} trigger to {:?} while enabled", line, edge);
        }
        config.trigger = edge;
        self.controller.set_trigger(line, edge);
    }

    pub fn enable(&mut self, line: ExtiLine) {
        debug!("Enabling {:?}", line);
        self.lines[line.index()].enabled = true;
        self.controller.set_enabled(line, true);
    }

    pub fn disable(&mut self, line: ExtiLine) {
        debug!("Disabling {:?}", line);
        self.lines[line.index()].enabled = false;
        self.controller.set_enabled(line, false);
    }

    /// Installs the handler for `line`, replacing the previous one.
    pub fn set_callback(&mut self, line: ExtiLine, handler: Callback<Self>) {
        self.callbacks.set(line, handler);
    }

    pub fn config(&self, line: ExtiLine) -> EdgeTriggerConfig {
        self.lines[line.index()]
    }

    /// Runs the handler registered for `line`. This is what the interrupt
    /// vector calls.
    pub fn deliver(&mut self, line: ExtiLine) {
        match self.callbacks.get(line) {
            Some(handler) => handler(self),
            None => trace!("No callback for {:?}", line),
        }
    }

    /// Delivers every event pending in `mailbox`, highest priority line first.
    /// Returns how many were delivered.
    pub fn dispatch(&mut self, mailbox: &ExtiMailbox) -> usize {
        let mut delivered = 0;
        for &line in ExtiLine::ALL {
            if mailbox.take(line) {
                self.deliver(line);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn controller(&self) -> &E {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut E {
        &mut self.controller
    }

    pub fn app(&self) -> &U {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut U {
        &mut self.app
    }
}
