//! Bit-exact wire framing for client<->service control messages.
//!
//! Reference: SPEC_FULL.md Section 6. All integers are network
//! (big-endian) byte order, matching the manual `to_be_bytes` packing
//! style `qc-01-peer-discovery::domain::enr::record` uses for its own
//! wire-ish type, generalized here to a length-prefixed frame using
//! `bytes::{Buf, BufMut}` for cursor bookkeeping.

use bytes::{Buf, BufMut, BytesMut};

use crate::domain::address::local_info;
use crate::domain::ats::{AtsProperties, AtsProperty, NetworkType};
use crate::domain::errors::ClientProtocolError;
use crate::domain::identity::PeerIdentity;

use super::message_type as mt;

/// A fully decoded client<->service frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Start {
        options: u32,
        self_id: PeerIdentity,
    },
    Hello {
        hello_bytes: Vec<u8>,
    },
    Send {
        peer: PeerIdentity,
        timeout_us: u64,
        payload: Vec<u8>,
    },
    SendOk {
        success: u32,
        bytes_msg: u32,
        bytes_physical: u32,
        latency_us: u64,
        peer: PeerIdentity,
    },
    Connect {
        quota_in: u32,
        quota_out: u32,
        peer: PeerIdentity,
    },
    Disconnect {
        peer: PeerIdentity,
    },
    RequestConnect {
        connect: u32,
        peer: PeerIdentity,
    },
    AddressToString {
        numeric_only: bool,
        timeout_us: u64,
        address: Vec<u8>,
        plugin_name: String,
    },
    AddressToStringReply {
        res: i32,
        string: Option<String>,
    },
    MonitorPeerRequest {
        one_shot: u32,
        peer: PeerIdentity,
    },
    MonitorPeerResponse {
        peer: PeerIdentity,
        local_info: u32,
        state: u32,
        state_timeout_us: u64,
        address: Vec<u8>,
        plugin_name: String,
    },
    /// A zero-length terminator for the `MONITOR_PEER_RESPONSE` stream
    /// (Section 4.1, `one_shot`).
    MonitorPeerResponseEnd,
    MonitorValidationRequest {
        one_shot: u32,
        peer: PeerIdentity,
    },
    MonitorValidationResponse {
        peer: PeerIdentity,
        local_info: u32,
        state: u32,
        state_timeout_us: u64,
        address: Vec<u8>,
        plugin_name: String,
        last_validation_us: u64,
        valid_until_us: u64,
        next_validation_us: u64,
    },
    MonitorValidationResponseEnd,
    TrafficMetric {
        peer: PeerIdentity,
        delay_in_us: u64,
        delay_out_us: u64,
        properties: AtsProperties,
    },
    BlacklistInit,
    BlacklistQuery {
        peer: PeerIdentity,
        transport_name: String,
    },
    BlacklistReply {
        is_allowed: u32,
        peer: PeerIdentity,
    },
    Recv {
        peer: PeerIdentity,
        payload: Vec<u8>,
    },
}

fn put_peer(buf: &mut BytesMut, peer: &PeerIdentity) {
    buf.put_slice(peer.as_bytes());
}

fn get_peer(buf: &mut impl Buf) -> Result<PeerIdentity, ClientProtocolError> {
    require(buf, 32)?;
    let mut bytes = [0u8; 32];
    buf.copy_to_slice(&mut bytes);
    Ok(PeerIdentity::new(bytes))
}

fn require(buf: &impl Buf, n: usize) -> Result<(), ClientProtocolError> {
    if buf.remaining() < n {
        Err(ClientProtocolError::FrameTooShort {
            need: n,
            got: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

/// Append an ASCII string plus its terminating NUL byte.
fn put_nul_terminated(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

/// Read a NUL-terminated ASCII string occupying the rest of `buf`.
fn get_nul_terminated(buf: &mut impl Buf) -> Result<String, ClientProtocolError> {
    let mut bytes = Vec::new();
    loop {
        if buf.remaining() == 0 {
            return Err(ClientProtocolError::UnterminatedPluginName);
        }
        let b = buf.get_u8();
        if b == 0 {
            break;
        }
        bytes.push(b);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn put_ats_properties(buf: &mut BytesMut, properties: &AtsProperties) {
    buf.put_u32(properties.len() as u32);
    for prop in properties {
        match prop {
            AtsProperty::NetworkType(n) => {
                buf.put_u8(0);
                buf.put_u32(network_type_to_wire(*n));
            }
            AtsProperty::DistanceHops(v) => {
                buf.put_u8(1);
                buf.put_u32(*v);
            }
            AtsProperty::DelayMs(v) => {
                buf.put_u8(2);
                buf.put_u32(*v);
            }
            AtsProperty::ThroughputBytesPerSec(v) => {
                buf.put_u8(3);
                buf.put_u32(*v);
            }
        }
    }
}

fn get_ats_properties(buf: &mut impl Buf) -> Result<AtsProperties, ClientProtocolError> {
    require(buf, 4)?;
    let count = buf.get_u32();
    let mut properties = Vec::with_capacity(count as usize);
    for _ in 0..count {
        require(buf, 5)?;
        let tag = buf.get_u8();
        let value = buf.get_u32();
        let prop = match tag {
            0 => AtsProperty::NetworkType(network_type_from_wire(value)),
            1 => AtsProperty::DistanceHops(value),
            2 => AtsProperty::DelayMs(value),
            3 => AtsProperty::ThroughputBytesPerSec(value),
            other => return Err(ClientProtocolError::UnknownMessageType(other as u16)),
        };
        properties.push(prop);
    }
    Ok(properties)
}

fn network_type_to_wire(n: NetworkType) -> u32 {
    match n {
        NetworkType::Loopback => 0,
        NetworkType::Lan => 1,
        NetworkType::Wan => 2,
        NetworkType::Wlan => 3,
        NetworkType::Bluetooth => 4,
        NetworkType::Unspecified => 5,
    }
}

fn network_type_from_wire(v: u32) -> NetworkType {
    match v {
        0 => NetworkType::Loopback,
        1 => NetworkType::Lan,
        2 => NetworkType::Wan,
        3 => NetworkType::Wlan,
        4 => NetworkType::Bluetooth,
        _ => NetworkType::Unspecified,
    }
}

impl ClientMessage {
    fn type_tag(&self) -> u16 {
        match self {
            Self::Start { .. } => mt::START,
            Self::Hello { .. } => mt::HELLO,
            Self::Send { .. } => mt::SEND,
            Self::SendOk { .. } => mt::SEND_OK,
            Self::Connect { .. } => mt::CONNECT,
            Self::Disconnect { .. } => mt::DISCONNECT,
            Self::RequestConnect { .. } => mt::REQUEST_CONNECT,
            Self::AddressToString { .. } => mt::ADDRESS_TO_STRING,
            Self::AddressToStringReply { .. } => mt::ADDRESS_TO_STRING_REPLY,
            Self::MonitorPeerRequest { .. } => mt::MONITOR_PEER_REQUEST,
            Self::MonitorPeerResponse { .. } | Self::MonitorPeerResponseEnd => {
                mt::MONITOR_PEER_RESPONSE
            }
            Self::MonitorValidationRequest { .. } => mt::MONITOR_VALIDATION_REQUEST,
            Self::MonitorValidationResponse { .. } | Self::MonitorValidationResponseEnd => {
                mt::MONITOR_VALIDATION_RESPONSE
            }
            Self::TrafficMetric { .. } => mt::TRAFFIC_METRIC,
            Self::BlacklistInit => mt::BLACKLIST_INIT,
            Self::BlacklistQuery { .. } => mt::BLACKLIST_QUERY,
            Self::BlacklistReply { .. } => mt::BLACKLIST_REPLY,
            Self::Recv { .. } => mt::RECV,
        }
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        match self {
            Self::Start { options, self_id } => {
                buf.put_u32(*options);
                put_peer(buf, self_id);
            }
            Self::Hello { hello_bytes } => {
                buf.put_slice(hello_bytes);
            }
            Self::Send {
                peer,
                timeout_us,
                payload,
            } => {
                buf.put_u32(0); // reserved
                put_peer(buf, peer);
                buf.put_u64(*timeout_us);
                buf.put_slice(payload);
            }
            Self::SendOk {
                success,
                bytes_msg,
                bytes_physical,
                latency_us,
                peer,
            } => {
                buf.put_u32(*success);
                buf.put_u32(*bytes_msg);
                buf.put_u32(*bytes_physical);
                buf.put_u64(*latency_us);
                put_peer(buf, peer);
            }
            Self::Connect {
                quota_in,
                quota_out,
                peer,
            } => {
                buf.put_u32(*quota_in);
                buf.put_u32(*quota_out);
                put_peer(buf, peer);
            }
            Self::Disconnect { peer } => {
                buf.put_u32(0); // reserved
                put_peer(buf, peer);
            }
            Self::RequestConnect { connect, peer } => {
                buf.put_u32(*connect);
                put_peer(buf, peer);
            }
            Self::AddressToString {
                numeric_only,
                timeout_us,
                address,
                plugin_name,
            } => {
                buf.put_i16(if *numeric_only { 1 } else { 0 });
                buf.put_u16(address.len() as u16);
                buf.put_u64(*timeout_us);
                buf.put_slice(address);
                put_nul_terminated(buf, plugin_name);
            }
            Self::AddressToStringReply { res, string } => {
                buf.put_i32(*res);
                match string {
                    Some(s) => {
                        buf.put_u32(s.len() as u32 + 1);
                        put_nul_terminated(buf, s);
                    }
                    None => {
                        buf.put_u32(0);
                    }
                }
            }
            Self::MonitorPeerRequest { one_shot, peer } => {
                buf.put_u32(*one_shot);
                put_peer(buf, peer);
            }
            Self::MonitorPeerResponse {
                peer,
                local_info,
                state,
                state_timeout_us,
                address,
                plugin_name,
            } => {
                buf.put_u32(0); // reserved
                put_peer(buf, peer);
                buf.put_u32(address.len() as u32);
                buf.put_u32(plugin_name.len() as u32);
                buf.put_u32(*local_info);
                buf.put_u32(*state);
                buf.put_u64(*state_timeout_us);
                buf.put_slice(address);
                buf.put_slice(plugin_name.as_bytes());
            }
            Self::MonitorPeerResponseEnd => {}
            Self::MonitorValidationRequest { one_shot, peer } => {
                buf.put_u32(*one_shot);
                put_peer(buf, peer);
            }
            Self::MonitorValidationResponse {
                peer,
                local_info,
                state,
                state_timeout_us,
                address,
                plugin_name,
                last_validation_us,
                valid_until_us,
                next_validation_us,
            } => {
                buf.put_u32(0);
                put_peer(buf, peer);
                buf.put_u32(address.len() as u32);
                buf.put_u32(plugin_name.len() as u32);
                buf.put_u32(*local_info);
                buf.put_u32(*state);
                buf.put_u64(*state_timeout_us);
                buf.put_u64(*last_validation_us);
                buf.put_u64(*valid_until_us);
                buf.put_u64(*next_validation_us);
                buf.put_slice(address);
                buf.put_slice(plugin_name.as_bytes());
            }
            Self::MonitorValidationResponseEnd => {}
            Self::TrafficMetric {
                peer,
                delay_in_us,
                delay_out_us,
                properties,
            } => {
                put_peer(buf, peer);
                buf.put_u64(*delay_in_us);
                buf.put_u64(*delay_out_us);
                put_ats_properties(buf, properties);
            }
            Self::BlacklistInit => {}
            Self::BlacklistQuery {
                peer,
                transport_name,
            } => {
                buf.put_u32(0); // reserved
                put_peer(buf, peer);
                put_nul_terminated(buf, transport_name);
            }
            Self::BlacklistReply { is_allowed, peer } => {
                buf.put_u32(*is_allowed);
                put_peer(buf, peer);
            }
            Self::Recv { peer, payload } => {
                put_peer(buf, peer);
                buf.put_slice(payload);
            }
        }
    }

    /// Encode a full frame: `{size: u16, type: u16}` header plus body.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = BytesMut::new();
        self.encode_body(&mut body);
        let mut frame = BytesMut::with_capacity(mt::HEADER_SIZE + body.len());
        frame.put_u16((mt::HEADER_SIZE + body.len()) as u16);
        frame.put_u16(self.type_tag());
        frame.extend_from_slice(&body);
        frame.to_vec()
    }

    /// Decode one frame from `buf`, which must contain exactly the bytes
    /// of a single frame (header included).
    pub fn decode(mut buf: &[u8]) -> Result<Self, ClientProtocolError> {
        require(&buf, mt::HEADER_SIZE)?;
        let declared_size = buf.get_u16() as usize;
        let msg_type = buf.get_u16();
        if declared_size != buf.remaining() + mt::HEADER_SIZE {
            return Err(ClientProtocolError::LengthMismatch {
                declared: declared_size,
                actual: buf.remaining() + mt::HEADER_SIZE,
            });
        }
        Self::decode_body(msg_type, &mut buf)
    }

    fn decode_body(msg_type: u16, buf: &mut impl Buf) -> Result<Self, ClientProtocolError> {
        match msg_type {
            mt::START => {
                require(buf, 4 + 32)?;
                let options = buf.get_u32();
                let self_id = get_peer(buf)?;
                Ok(Self::Start { options, self_id })
            }
            mt::HELLO => {
                let hello_bytes = remaining_vec(buf);
                Ok(Self::Hello { hello_bytes })
            }
            mt::SEND => {
                require(buf, 4 + 32 + 8)?;
                buf.get_u32(); // reserved
                let peer = get_peer(buf)?;
                let timeout_us = buf.get_u64();
                let payload = remaining_vec(buf);
                Ok(Self::Send {
                    peer,
                    timeout_us,
                    payload,
                })
            }
            mt::SEND_OK => {
                require(buf, 4 + 4 + 4 + 8 + 32)?;
                let success = buf.get_u32();
                let bytes_msg = buf.get_u32();
                let bytes_physical = buf.get_u32();
                let latency_us = buf.get_u64();
                let peer = get_peer(buf)?;
                Ok(Self::SendOk {
                    success,
                    bytes_msg,
                    bytes_physical,
                    latency_us,
                    peer,
                })
            }
            mt::CONNECT => {
                require(buf, 4 + 4 + 32)?;
                let quota_in = buf.get_u32();
                let quota_out = buf.get_u32();
                let peer = get_peer(buf)?;
                Ok(Self::Connect {
                    quota_in,
                    quota_out,
                    peer,
                })
            }
            mt::DISCONNECT => {
                require(buf, 4 + 32)?;
                buf.get_u32();
                let peer = get_peer(buf)?;
                Ok(Self::Disconnect { peer })
            }
            mt::REQUEST_CONNECT => {
                require(buf, 4 + 32)?;
                let connect = buf.get_u32();
                let peer = get_peer(buf)?;
                Ok(Self::RequestConnect { connect, peer })
            }
            mt::ADDRESS_TO_STRING => {
                require(buf, 2 + 2 + 8)?;
                let numeric_only = buf.get_i16() != 0;
                let addrlen = buf.get_u16() as usize;
                let timeout_us = buf.get_u64();
                require(buf, addrlen)?;
                let mut address = vec![0u8; addrlen];
                buf.copy_to_slice(&mut address);
                let plugin_name = get_nul_terminated(buf)?;
                Ok(Self::AddressToString {
                    numeric_only,
                    timeout_us,
                    address,
                    plugin_name,
                })
            }
            mt::ADDRESS_TO_STRING_REPLY => {
                require(buf, 4 + 4)?;
                let res = buf.get_i32();
                let addr_len = buf.get_u32() as usize;
                let string = if addr_len == 0 {
                    None
                } else {
                    require(buf, addr_len)?;
                    let mut bytes = vec![0u8; addr_len];
                    buf.copy_to_slice(&mut bytes);
                    if bytes.pop() != Some(0) {
                        return Err(ClientProtocolError::UnterminatedPluginName);
                    }
                    Some(String::from_utf8_lossy(&bytes).into_owned())
                };
                Ok(Self::AddressToStringReply { res, string })
            }
            mt::MONITOR_PEER_REQUEST => {
                require(buf, 4 + 32)?;
                let one_shot = buf.get_u32();
                let peer = get_peer(buf)?;
                Ok(Self::MonitorPeerRequest { one_shot, peer })
            }
            mt::MONITOR_PEER_RESPONSE => {
                if buf.remaining() == 0 {
                    return Ok(Self::MonitorPeerResponseEnd);
                }
                decode_peer_response(buf).map(|r| r.into_peer_response())
            }
            mt::MONITOR_VALIDATION_REQUEST => {
                require(buf, 4 + 32)?;
                let one_shot = buf.get_u32();
                let peer = get_peer(buf)?;
                Ok(Self::MonitorValidationRequest { one_shot, peer })
            }
            mt::MONITOR_VALIDATION_RESPONSE => {
                if buf.remaining() == 0 {
                    return Ok(Self::MonitorValidationResponseEnd);
                }
                decode_validation_response(buf)
            }
            mt::TRAFFIC_METRIC => {
                require(buf, 32 + 8 + 8)?;
                let peer = get_peer(buf)?;
                let delay_in_us = buf.get_u64();
                let delay_out_us = buf.get_u64();
                let properties = get_ats_properties(buf)?;
                Ok(Self::TrafficMetric {
                    peer,
                    delay_in_us,
                    delay_out_us,
                    properties,
                })
            }
            mt::BLACKLIST_INIT => Ok(Self::BlacklistInit),
            mt::BLACKLIST_QUERY => {
                require(buf, 4 + 32)?;
                buf.get_u32();
                let peer = get_peer(buf)?;
                let transport_name = get_nul_terminated(buf)?;
                Ok(Self::BlacklistQuery {
                    peer,
                    transport_name,
                })
            }
            mt::BLACKLIST_REPLY => {
                require(buf, 4 + 32)?;
                let is_allowed = buf.get_u32();
                let peer = get_peer(buf)?;
                Ok(Self::BlacklistReply { is_allowed, peer })
            }
            mt::RECV => {
                require(buf, 32)?;
                let peer = get_peer(buf)?;
                let payload = remaining_vec(buf);
                Ok(Self::Recv { peer, payload })
            }
            other => Err(ClientProtocolError::UnknownMessageType(other)),
        }
    }
}

fn remaining_vec(buf: &mut impl Buf) -> Vec<u8> {
    let mut out = vec![0u8; buf.remaining()];
    buf.copy_to_slice(&mut out);
    out
}

/// Shared decode path for `MONITOR_PEER_RESPONSE` and
/// `MONITOR_VALIDATION_RESPONSE`, which share a common prefix (Section
/// 6's table).
struct DecodedMonitorPrefix {
    peer: PeerIdentity,
    local_info: u32,
    state: u32,
    state_timeout_us: u64,
    address: Vec<u8>,
    plugin_name: String,
}

impl DecodedMonitorPrefix {
    fn into_peer_response(self) -> ClientMessage {
        ClientMessage::MonitorPeerResponse {
            peer: self.peer,
            local_info: self.local_info,
            state: self.state,
            state_timeout_us: self.state_timeout_us,
            address: self.address,
            plugin_name: self.plugin_name,
        }
    }
}

fn decode_peer_response(buf: &mut impl Buf) -> Result<DecodedMonitorPrefix, ClientProtocolError> {
    require(buf, 4 + 32 + 4 + 4 + 4 + 4 + 8)?;
    buf.get_u32(); // reserved
    let peer = get_peer(buf)?;
    let addrlen = buf.get_u32() as usize;
    let pluginlen = buf.get_u32() as usize;
    let local_info = buf.get_u32();
    let state = buf.get_u32();
    let state_timeout_us = buf.get_u64();
    require(buf, addrlen + pluginlen)?;
    let mut address = vec![0u8; addrlen];
    buf.copy_to_slice(&mut address);
    let mut plugin_bytes = vec![0u8; pluginlen];
    buf.copy_to_slice(&mut plugin_bytes);
    let plugin_name = String::from_utf8_lossy(&plugin_bytes).into_owned();
    Ok(DecodedMonitorPrefix {
        peer,
        local_info,
        state,
        state_timeout_us,
        address,
        plugin_name,
    })
}

fn decode_validation_response(buf: &mut impl Buf) -> Result<ClientMessage, ClientProtocolError> {
    require(buf, 4 + 32 + 4 + 4 + 4 + 4 + 8 + 8 + 8 + 8)?;
    buf.get_u32();
    let peer = get_peer(buf)?;
    let addrlen = buf.get_u32() as usize;
    let pluginlen = buf.get_u32() as usize;
    let local_info = buf.get_u32();
    let state = buf.get_u32();
    let state_timeout_us = buf.get_u64();
    let last_validation_us = buf.get_u64();
    let valid_until_us = buf.get_u64();
    let next_validation_us = buf.get_u64();
    require(buf, addrlen + pluginlen)?;
    let mut address = vec![0u8; addrlen];
    buf.copy_to_slice(&mut address);
    let mut plugin_bytes = vec![0u8; pluginlen];
    buf.copy_to_slice(&mut plugin_bytes);
    let plugin_name = String::from_utf8_lossy(&plugin_bytes).into_owned();
    Ok(ClientMessage::MonitorValidationResponse {
        peer,
        local_info,
        state,
        state_timeout_us,
        address,
        plugin_name,
        last_validation_us,
        valid_until_us,
        next_validation_us,
    })
}

/// INBOUND bit re-exported for callers building `MonitorPeerResponse`
/// frames out of an [`crate::domain::Address`].
pub const INBOUND_FLAG: u32 = local_info::INBOUND;
