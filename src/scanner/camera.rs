use std::sync::Arc;

use tokio::sync::watch;

/// What the camera currently sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lens {
    /// Decoded text of the code in frame, if any.
    pub frame: Option<String>,
    /// Set while the camera cannot be opened.
    pub fault: Option<String>,
}

/// Stand-in for a device camera plus decoder. Clients place decoded frames in
/// front of it; the scan loop samples it at its own rate.
#[derive(Clone)]
pub struct Camera {
    lens: Arc<watch::Sender<Lens>>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Lens::default());
        Self { lens: Arc::new(tx) }
    }

    pub fn show(&self, frame: Option<String>) {
        self.lens.send_modify(|lens| lens.frame = frame);
    }

    pub fn set_available(&self, available: bool, reason: Option<String>) {
        let fault = if available {
            None
        } else {
            Some(reason.unwrap_or_else(|| "camera not available".to_string()))
        };
        self.lens.send_modify(|lens| lens.fault = fault);
    }

    pub fn lens(&self) -> Lens {
        self.lens.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Lens> {
        self.lens.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_and_fault_are_independent() {
        let camera = Camera::new();
        camera.show(Some("reward 5".into()));
        camera.set_available(false, None);
        assert_eq!(
            camera.lens(),
            Lens {
                frame: Some("reward 5".into()),
                fault: Some("camera not available".into()),
            }
        );
        camera.set_available(true, Some("ignored".into()));
        assert_eq!(camera.lens().fault, None);
        assert_eq!(camera.subscribe().borrow().frame.as_deref(), Some("reward 5"));
    }
}
