// magic_home.rs
//! Magic Home (Flux LED) controllers: UDP broadcast discovery on port 48899
//! and a checksummed binary command protocol over TCP.

use super::{ControlError, ControlOptions, DeviceController, DeviceDiscoverer, DiscoveryError};
use crate::models::{Device, DeviceState, Rgb};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, UdpSocket},
    time::{Instant, timeout, timeout_at},
};
use tracing::debug;

pub const DISCOVERY_PORT: u16 = 48899;
pub const DEFAULT_CONTROL_PORT: u16 = 5577;
const DISCOVERY_MESSAGE: &[u8] = b"HF-A11ASSISTHREAD";

const POWER_ON: u8 = 0x23;
const POWER_OFF: u8 = 0x24;
const ACK_LEN: usize = 4;
const STATE_LEN: usize = 14;

pub struct MagicHomeDiscoverer {
    broadcast: SocketAddr,
}

impl MagicHomeDiscoverer {
    pub fn new() -> Self {
        Self {
            broadcast: SocketAddr::from((Ipv4Addr::BROADCAST, DISCOVERY_PORT)),
        }
    }
}

#[async_trait]
impl DeviceDiscoverer for MagicHomeDiscoverer {
    async fn scan(&self, scan_timeout: Duration) -> Result<Vec<Device>, DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;
        socket.send_to(DISCOVERY_MESSAGE, self.broadcast).await?;

        let deadline = Instant::now() + scan_timeout;
        let mut devices: Vec<Device> = Vec::new();
        let mut buf = [0u8; 256];

        // Collect replies until the scan window closes.
        loop {
            match timeout_at(deadline, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => match parse_discovery_reply(&buf[..len]) {
                    Some(device) if !devices.iter().any(|d| d.id == device.id) => {
                        devices.push(device)
                    }
                    Some(_) => {}
                    None => debug!(%from, "Ignoring malformed discovery reply"),
                },
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break,
            }
        }

        Ok(devices)
    }
}

/// Replies look like `192.168.1.40,ACCF23A1B2C3,AK001-ZJ100`.
fn parse_discovery_reply(data: &[u8]) -> Option<Device> {
    let text = std::str::from_utf8(data).ok()?.trim();
    let mut parts = text.split(',').map(str::trim);

    let address: Ipv4Addr = parts.next()?.parse().ok()?;
    let id = parts.next().filter(|id| !id.is_empty())?;
    let model = parts.next().filter(|m| !m.is_empty()).map(String::from);

    Some(Device {
        id: id.to_string(),
        address: address.to_string(),
        model,
    })
}

pub struct MagicHomeController {
    port: u16,
    io_timeout: Duration,
}

impl MagicHomeController {
    pub fn new(port: u16, io_timeout: Duration) -> Self {
        Self { port, io_timeout }
    }

    async fn send(
        &self,
        address: &str,
        command: &[u8],
        reply_len: usize,
    ) -> Result<Vec<u8>, ControlError> {
        let frame = with_checksum(command);
        let exchange = async {
            let mut stream = TcpStream::connect((address, self.port)).await?;
            stream.write_all(&frame).await?;
            let mut reply = vec![0u8; reply_len];
            stream.read_exact(&mut reply).await?;
            Ok::<_, std::io::Error>(reply)
        };

        timeout(self.io_timeout, exchange)
            .await
            .map_err(|_| ControlError::TimedOut(self.io_timeout))?
            .map_err(ControlError::from)
    }

    async fn send_command(
        &self,
        address: &str,
        command: &[u8],
        options: ControlOptions,
    ) -> Result<(), ControlError> {
        let reply_len = if options.wait_for_reply { ACK_LEN } else { 0 };
        self.send(address, command, reply_len).await.map(drop)
    }
}

#[async_trait]
impl DeviceController for MagicHomeController {
    async fn set_color_with_brightness(
        &self,
        address: &str,
        color: Rgb,
        brightness: u8,
        options: ControlOptions,
    ) -> Result<(), ControlError> {
        let command = color_command(scale(color, brightness));
        self.send_command(address, &command, options).await
    }

    async fn set_power(
        &self,
        address: &str,
        on: bool,
        options: ControlOptions,
    ) -> Result<(), ControlError> {
        let command = [0x71, if on { POWER_ON } else { POWER_OFF }, 0x0F];
        self.send_command(address, &command, options).await
    }

    async fn query_state(&self, address: &str) -> Result<DeviceState, ControlError> {
        let reply = self.send(address, &[0x81, 0x8A, 0x8B], STATE_LEN).await?;
        parse_state(&reply)
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn with_checksum(command: &[u8]) -> Vec<u8> {
    let mut frame = command.to_vec();
    frame.push(checksum(command));
    frame
}

fn color_command(color: Rgb) -> [u8; 7] {
    [0x31, color.r, color.g, color.b, 0x00, 0xF0, 0x0F]
}

/// Scales each channel by a 0..=100 brightness, rounding half up.
fn scale(color: Rgb, brightness: u8) -> Rgb {
    let channel = |c: u8| ((u32::from(c) * u32::from(brightness.min(100)) + 50) / 100) as u8;
    Rgb {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}

fn parse_state(reply: &[u8]) -> Result<DeviceState, ControlError> {
    if reply.len() != STATE_LEN || reply[0] != 0x81 {
        return Err(ControlError::Protocol(format!(
            "unexpected state reply {reply:02X?}"
        )));
    }
    if checksum(&reply[..STATE_LEN - 1]) != reply[STATE_LEN - 1] {
        return Err(ControlError::Protocol("state reply checksum mismatch".into()));
    }

    Ok(DeviceState {
        device_type: reply[1],
        on: reply[2] == POWER_ON,
        mode: reply[3],
        speed: reply[5],
        color: Rgb {
            r: reply[6],
            g: reply[7],
            b: reply[8],
        },
        warm_white: reply[9],
        firmware_version: reply[10],
        cold_white: reply[11],
    })
}
