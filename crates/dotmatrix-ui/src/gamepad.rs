use log::warn;

/// Polls the host gamepad through gilrs and folds button events into the
/// 8-bit Joypad mask (0 = pressed), using the button IDs configured in
/// `gamepad.bind`.
pub struct GamepadInput {
    gilrs: Option<gilrs::Gilrs>,
    bind: [u32; 8],
    mask: u8,
}

impl GamepadInput {
    pub fn new(enabled: bool, bind: [u32; 8]) -> Self {
        let gilrs = if enabled {
            match gilrs::Gilrs::new() {
                Ok(g) => Some(g),
                Err(e) => {
                    warn!("gamepad support unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };
        Self {
            gilrs,
            bind,
            mask: 0xFF,
        }
    }

    /// Drain pending events and return the current mask.
    pub fn poll(&mut self) -> u8 {
        let bind = self.bind;
        let mut mask = self.mask;
        if let Some(gilrs) = self.gilrs.as_mut() {
            while let Some(gilrs::Event { event, .. }) = gilrs.next_event() {
                match event {
                    gilrs::EventType::ButtonPressed(_, code) => {
                        if let Some(bit) = bind.iter().position(|&b| b == code.into_u32()) {
                            mask &= !(1 << bit);
                        }
                    }
                    gilrs::EventType::ButtonReleased(_, code) => {
                        if let Some(bit) = bind.iter().position(|&b| b == code.into_u32()) {
                            mask |= 1 << bit;
                        }
                    }
                    _ => {}
                }
            }
        }
        self.mask = mask;
        self.mask
    }
}
