//! Passive Wake-on-LAN listener: decodes raw IPv4/UDP datagrams, recognises
//! magic packets for one MAC address and fires an action once per burst.

pub mod common;
pub mod config;
pub mod decode;
pub mod detector;
pub mod filter;
pub mod layer4;
