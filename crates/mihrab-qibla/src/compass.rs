//! Compass state for the Qibla view.
//!
//! Device orientation arrives as a push stream of nullable headings. Only the
//! most recent value matters, so the stream is a `watch` channel: producers
//! overwrite, the view samples whatever is latest. Without a sensor the view
//! falls back to manual rotation.

use tokio::sync::watch;

/// Producer side of the heading stream.
#[derive(Debug)]
pub struct HeadingSource {
    tx: watch::Sender<Option<f64>>,
}

/// Consumer side of the heading stream.
#[derive(Debug, Clone)]
pub struct HeadingReceiver {
    rx: watch::Receiver<Option<f64>>,
}

/// Creates a connected heading source and receiver with no reading yet.
pub fn heading_channel() -> (HeadingSource, HeadingReceiver) {
    let (tx, rx) = watch::channel(None);
    (HeadingSource { tx }, HeadingReceiver { rx })
}

impl HeadingSource {
    /// Publishes a heading in degrees. `None` or a non-finite value means the
    /// sensor has no fix for this event.
    pub fn push(&self, heading: Option<f64>) {
        let value = heading.filter(|h| h.is_finite()).map(|h| h.rem_euclid(360.0));
        self.tx.send_replace(value);
    }

    pub fn subscribe(&self) -> HeadingReceiver {
        HeadingReceiver { rx: self.tx.subscribe() }
    }
}

impl HeadingReceiver {
    /// Most recent published heading.
    pub fn latest(&self) -> Option<f64> {
        *self.rx.borrow()
    }

    /// Waits for the next publication. Returns `false` once the source is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Needle and arrow angles for the Qibla compass.
#[derive(Debug, Clone)]
pub struct Compass {
    qibla_bearing: f64,
    heading: f64,
    sensor: Option<HeadingReceiver>,
}

impl Compass {
    /// Manual mode: the user rotates the dial by hand.
    pub fn manual(qibla_bearing: f64) -> Self {
        Self { qibla_bearing, heading: 0.0, sensor: None }
    }

    /// Sensor mode: heading follows the stream, ignoring null readings.
    pub fn with_sensor(qibla_bearing: f64, sensor: HeadingReceiver) -> Self {
        Self { qibla_bearing, heading: 0.0, sensor: Some(sensor) }
    }

    pub fn is_manual(&self) -> bool {
        self.sensor.is_none()
    }

    pub fn qibla_bearing(&self) -> f64 {
        self.qibla_bearing
    }

    /// Current heading, sampling the sensor first when one is attached.
    pub fn heading(&mut self) -> f64 {
        if let Some(latest) = self.sensor.as_ref().and_then(HeadingReceiver::latest) {
            self.heading = latest;
        }
        self.heading
    }

    /// Manual rotation by `delta` degrees (negative turns left).
    pub fn rotate(&mut self, delta: f64) {
        self.heading = (self.heading + delta).rem_euclid(360.0);
    }

    /// Manual reset to North.
    pub fn reset(&mut self) {
        self.heading = 0.0;
    }

    /// Angle the user still has to turn, clockwise, to face the Qibla.
    pub fn relative_qibla(&mut self) -> f64 {
        (self.qibla_bearing - self.heading()).rem_euclid(360.0)
    }

    /// `"58.5° from North"`.
    pub fn readout(&self) -> String {
        format!("{:.1}° from North", self.qibla_bearing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_value_wins() {
        let (source, rx) = heading_channel();
        assert_eq!(rx.latest(), None);
        source.push(Some(10.0));
        source.push(Some(370.0));
        assert_eq!(rx.latest(), Some(10.0));
        source.push(Some(f64::NAN));
        assert_eq!(rx.latest(), None);
    }

    #[test]
    fn test_sensor_compass_ignores_null_readings() {
        let (source, rx) = heading_channel();
        let mut compass = Compass::with_sensor(58.5, rx);
        assert!(!compass.is_manual());

        source.push(Some(30.0));
        assert_eq!(compass.heading(), 30.0);
        source.push(None);
        assert_eq!(compass.heading(), 30.0);
        assert!((compass.relative_qibla() - 28.5).abs() < 1e-9);
    }

    #[test]
    fn test_manual_rotation_wraps() {
        let mut compass = Compass::manual(295.15);
        assert!(compass.is_manual());
        compass.rotate(-10.0);
        assert_eq!(compass.heading(), 350.0);
        compass.rotate(20.0);
        assert_eq!(compass.heading(), 10.0);
        compass.reset();
        assert_eq!(compass.heading(), 0.0);
        assert_eq!(Compass::manual(58.48).readout(), "58.5° from North");
    }

    #[tokio::test]
    async fn test_changed_wakes_on_push() {
        let (source, mut rx) = heading_channel();
        let waiter = tokio::spawn(async move {
            let alive = rx.changed().await;
            (alive, rx.latest())
        });
        source.push(Some(123.0));
        let (alive, latest) = waiter.await.unwrap();
        assert!(alive);
        assert_eq!(latest, Some(123.0));
    }
}
