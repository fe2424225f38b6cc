//! OSC sensor: receives device attitude and press state over UDP.
//!
//! Phone sensor apps can stream their attitude as OSC. Recognised addresses:
//! - `/orientation w x y z`: attitude quaternion (float, double or int args)
//! - `/press v`: play gesture, non-zero / `true` means pressed
//! - `/acceleration x y z`: user acceleration in g, for the shaker
//!
//! Anything else is ignored. Bundles are unpacked.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rosc::{decoder, OscMessage, OscPacket, OscType};

use super::{Quaternion, SensorEvent, SensorSender};

pub const ORIENTATION_ADDRESS: &str = "/orientation";
pub const PRESS_ADDRESS: &str = "/press";
pub const ACCELERATION_ADDRESS: &str = "/acceleration";

/// Translate a single OSC message into a sensor event.
pub fn parse_osc_message(msg: &OscMessage) -> Option<SensorEvent> {
    match msg.addr.as_str() {
        ORIENTATION_ADDRESS => {
            let w = extract_f64(&msg.args, 0)?;
            let x = extract_f64(&msg.args, 1)?;
            let y = extract_f64(&msg.args, 2)?;
            let z = extract_f64(&msg.args, 3)?;
            Some(SensorEvent::Orientation(Quaternion::new(w, x, y, z)))
        }
        PRESS_ADDRESS => {
            let pressed = match msg.args.first()? {
                OscType::Bool(b) => *b,
                _ => extract_f64(&msg.args, 0)? != 0.0,
            };
            Some(SensorEvent::Press(pressed))
        }
        ACCELERATION_ADDRESS => {
            let x = extract_f64(&msg.args, 0)?;
            let y = extract_f64(&msg.args, 1)?;
            let z = extract_f64(&msg.args, 2)?;
            Some(SensorEvent::Acceleration { x, y, z })
        }
        _ => None,
    }
}

/// Collect the sensor events carried by a packet, descending into bundles.
pub fn parse_osc_packet(packet: &OscPacket) -> Vec<SensorEvent> {
    match packet {
        OscPacket::Message(msg) => parse_osc_message(msg).into_iter().collect(),
        OscPacket::Bundle(bundle) => bundle.content.iter().flat_map(parse_osc_packet).collect(),
    }
}

fn extract_f64(args: &[OscType], index: usize) -> Option<f64> {
    args.get(index).and_then(|arg| match arg {
        OscType::Float(f) => Some(*f as f64),
        OscType::Double(d) => Some(*d),
        OscType::Int(i) => Some(*i as f64),
        _ => None,
    })
}

/// OSC listener running on a background thread.
pub struct OscSensor {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    port: u16,
}

impl OscSensor {
    /// Bind `127.0.0.1:port` and forward recognised messages to `sender`.
    pub fn start(port: u16, sender: SensorSender) -> io::Result<Self> {
        let socket = UdpSocket::bind(("127.0.0.1", port))?;
        // Short timeout so the stop flag is checked periodically.
        socket.set_read_timeout(Some(Duration::from_millis(100)))?;
        let port = socket.local_addr()?.port();

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();

        let thread = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            while !stop_clone.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((size, _addr)) => match decoder::decode_udp(&buf[..size]) {
                        Ok((_, packet)) => {
                            for event in parse_osc_packet(&packet) {
                                if sender.send(event).is_err() {
                                    log::debug!("sensor receiver dropped, stopping OSC listener");
                                    return;
                                }
                            }
                        }
                        Err(e) => log::warn!("undecodable OSC packet: {e:?}"),
                    },
                    Err(ref e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        log::error!("OSC socket error: {e}");
                        break;
                    }
                }
            }
        });

        log::info!("listening for OSC orientation on 127.0.0.1:{port}");
        Ok(Self {
            stop_flag,
            thread: Some(thread),
            port,
        })
    }

    /// The bound UDP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Signal the listener to stop and wait for its thread.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for OscSensor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::sensor_channel;
    use rosc::{encoder, OscBundle, OscTime};

    fn message(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn orientation_from_floats() {
        let msg = message(
            "/orientation",
            vec![
                OscType::Float(1.0),
                OscType::Float(0.0),
                OscType::Double(0.0),
                OscType::Int(0),
            ],
        );
        assert_eq!(
            parse_osc_message(&msg),
            Some(SensorEvent::Orientation(Quaternion::identity()))
        );
    }

    #[test]
    fn orientation_missing_component_ignored() {
        let msg = message("/orientation", vec![OscType::Float(1.0), OscType::Float(0.0)]);
        assert_eq!(parse_osc_message(&msg), None);
    }

    #[test]
    fn press_variants() {
        assert_eq!(
            parse_osc_message(&message("/press", vec![OscType::Int(1)])),
            Some(SensorEvent::Press(true))
        );
        assert_eq!(
            parse_osc_message(&message("/press", vec![OscType::Float(0.0)])),
            Some(SensorEvent::Press(false))
        );
        assert_eq!(
            parse_osc_message(&message("/press", vec![OscType::Bool(true)])),
            Some(SensorEvent::Press(true))
        );
        assert_eq!(parse_osc_message(&message("/press", vec![])), None);
    }

    #[test]
    fn acceleration_from_mixed_args() {
        let msg = message(
            "/acceleration",
            vec![OscType::Float(0.5), OscType::Double(-1.0), OscType::Int(2)],
        );
        assert_eq!(
            parse_osc_message(&msg),
            Some(SensorEvent::Acceleration {
                x: 0.5,
                y: -1.0,
                z: 2.0
            })
        );
        let short = message("/acceleration", vec![OscType::Float(0.5)]);
        assert_eq!(parse_osc_message(&short), None);
    }

    #[test]
    fn unknown_address_ignored() {
        assert_eq!(
            parse_osc_message(&message("/gyro", vec![OscType::Float(1.0)])),
            None
        );
    }

    #[test]
    fn bundle_unpacked_in_order() {
        let packet = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                OscPacket::Message(message("/press", vec![OscType::Int(1)])),
                OscPacket::Message(message("/ignored", vec![])),
                OscPacket::Message(message("/press", vec![OscType::Int(0)])),
            ],
        });
        assert_eq!(
            parse_osc_packet(&packet),
            vec![SensorEvent::Press(true), SensorEvent::Press(false)]
        );
    }

    #[test]
    fn start_and_stop() {
        let (tx, _rx) = sensor_channel();
        let mut sensor = OscSensor::start(19100, tx).unwrap();
        assert_eq!(sensor.port(), 19100);
        sensor.stop();
    }

    #[test]
    fn send_and_receive_orientation() {
        let (tx, rx) = sensor_channel();
        let mut sensor = OscSensor::start(0, tx).unwrap();

        let packet = OscPacket::Message(message(
            "/orientation",
            vec![
                OscType::Float(1.0),
                OscType::Float(0.0),
                OscType::Float(0.0),
                OscType::Float(0.0),
            ],
        ));
        let encoded = encoder::encode(&packet).unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .send_to(&encoded, ("127.0.0.1", sensor.port()))
            .unwrap();

        let event = rx.poll_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            event,
            Some(SensorEvent::Orientation(Quaternion::identity()))
        );

        sensor.stop();
    }

    #[test]
    fn bind_failure_on_used_port() {
        let (tx1, _rx1) = sensor_channel();
        let _first = OscSensor::start(19101, tx1).unwrap();

        let (tx2, _rx2) = sensor_channel();
        assert!(OscSensor::start(19101, tx2).is_err());
    }
}
