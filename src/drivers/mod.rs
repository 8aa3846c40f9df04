//! Hardware transport drivers.

pub mod asus_wmi;
