//! CAN 接口状态检查
//!
//! `if_nametoindex()` 判断接口是否存在，`ioctl(SIOCGIFFLAGS)` 读取 `IFF_UP`。
//! 只读操作，不需要特殊权限。

use crate::{CanDeviceError, CanDeviceErrorKind, CanError};
use libc::{AF_INET, IFF_UP, SIOCGIFFLAGS, SOCK_DGRAM, if_nametoindex, ifreq};
use std::ffi::CString;
use std::io;
use tracing::trace;

/// IFNAMSIZ - 1
const MAX_IFACE_NAME_LEN: usize = 15;

/// ioctl 用的临时 socket，离开作用域时关闭
struct FdGuard(libc::c_int);

impl Drop for FdGuard {
    fn drop(&mut self) {
        if self.0 >= 0 {
            unsafe { libc::close(self.0) };
        }
    }
}

fn not_found(message: String) -> CanError {
    CanError::Device(CanDeviceError::new(CanDeviceErrorKind::NotFound, message))
}

/// 检查 CAN 接口是否存在且处于 UP 状态
///
/// # 返回值
/// - `Ok(true)`: 接口存在且 IFF_UP 置位
/// - `Ok(false)`: 接口存在但处于 DOWN 状态
/// - `Err(CanError::Device)`: 接口名无效或接口不存在（`NotFound`）
/// - `Err(CanError::Io)`: socket/ioctl 失败
pub fn check_interface_status(interface: &str) -> Result<bool, CanError> {
    if interface.is_empty() || interface.len() > MAX_IFACE_NAME_LEN {
        return Err(not_found(format!(
            "Invalid interface name '{}' (1-{} characters)",
            interface, MAX_IFACE_NAME_LEN
        )));
    }

    let c_iface = CString::new(interface)
        .map_err(|e| not_found(format!("Invalid interface name '{}': {}", interface.escape_debug(), e)))?;

    let ifindex = unsafe { if_nametoindex(c_iface.as_ptr()) };
    if ifindex == 0 {
        let errno = io::Error::last_os_error();
        return Err(not_found(format!(
            "CAN interface '{}' does not exist ({}). Please create it first:\n  sudo ip link add dev {} type can",
            interface, errno, interface
        )));
    }

    let mut ifr: ifreq = unsafe { std::mem::zeroed() };
    let name = c_iface.as_bytes_with_nul();
    // 长度已检查：name.len() <= IFNAMSIZ
    unsafe {
        std::ptr::copy_nonoverlapping(
            name.as_ptr(),
            ifr.ifr_name.as_mut_ptr() as *mut u8,
            name.len(),
        );
    }

    let sockfd = unsafe { libc::socket(AF_INET, SOCK_DGRAM, 0) };
    if sockfd < 0 {
        return Err(CanError::Io(io::Error::last_os_error()));
    }
    let _guard = FdGuard(sockfd);

    let result = unsafe { libc::ioctl(sockfd, SIOCGIFFLAGS, &mut ifr as *mut ifreq) };
    if result < 0 {
        return Err(CanError::Io(io::Error::last_os_error()));
    }

    // ifru_flags 是 ifr_ifru union 的第一个字段（c_short）
    let flags = unsafe { *(std::ptr::addr_of!(ifr.ifr_ifru) as *const libc::c_short) };
    let is_up = (i32::from(flags) & IFF_UP) != 0;

    trace!(
        "CAN interface '{}' (index {}) flags=0x{:X} up={}",
        interface, ifindex, flags, is_up
    );
    Ok(is_up)
}
