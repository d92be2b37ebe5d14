//! Tests for platform-agnostic types

use symbolizer_core::engine::create_engine;
use symbolizer_core::types::{Address, Architecture, TraceStyle, SYSTEM, VERSION};

#[test]
fn test_address_from_u64()
{
    let addr = Address::from(0x1000);
    assert_eq!(addr.value(), 0x1000);
    let value: u64 = addr.into();
    assert_eq!(value, 0x1000);
}

#[test]
fn test_address_display()
{
    assert_eq!(Address::from(0x7ff8_0000_1234).to_string(), "0x00007ff800001234");
    assert_eq!(Address::ZERO.to_string(), "0x0000000000000000");
    assert_eq!(format!("{:x}", Address::from(0xabc)), "abc");
}

#[test]
fn test_address_parse()
{
    assert_eq!("0x1000".parse::<Address>().unwrap(), Address::from(0x1000));
    assert_eq!("0X1000".parse::<Address>().unwrap(), Address::from(0x1000));
    assert_eq!("  4096\n".parse::<Address>().unwrap(), Address::from(4096));
    assert_eq!("7ffe0000".parse::<Address>().unwrap(), Address::from(0x7ffe_0000));
    assert_eq!(
        "00007ff8`0000abcd".parse::<Address>().unwrap(),
        Address::from(0x7ff8_0000_abcd)
    );
    assert_eq!(
        "00000001`40001000".parse::<Address>().unwrap(),
        Address::from(0x1_4000_1000)
    );
    assert_eq!(
        "0000000140001000".parse::<Address>().unwrap(),
        Address::from(0x1_4000_1000)
    );
    assert_eq!("0".parse::<Address>().unwrap(), Address::ZERO);
    assert_eq!("10".parse::<Address>().unwrap(), Address::from(10));
    assert!("".parse::<Address>().is_err());
    assert!("0xzz".parse::<Address>().is_err());
    assert!("kernel32+0x10".parse::<Address>().is_err());
}

#[test]
fn test_address_from_hex()
{
    assert_eq!(Address::from_hex("10").unwrap(), Address::from(0x10));
    assert_eq!(Address::from_hex("0x10").unwrap(), Address::from(0x10));
    assert_eq!(Address::from_hex(" 140001000 ").unwrap(), Address::from(0x1_4000_1000));
    assert_eq!(
        Address::from_hex("00007ff8`0000abcd").unwrap(),
        Address::from(0x7ff8_0000_abcd)
    );
    assert!(Address::from_hex("").is_err());
    assert!(Address::from_hex("0x").is_err());
    assert!(Address::from_hex("kernel32").is_err());
}

#[test]
fn test_address_offset_from()
{
    let addr = Address::from(0x7ff8_1000_1234);
    assert_eq!(addr.offset_from(Address::from(0x7ff8_1000_0000)), Some(0x1234));
    assert_eq!(addr.offset_from(addr), Some(0));
    assert_eq!(addr.offset_from(Address::from(u64::MAX)), None);
}

#[test]
fn test_address_checked_add()
{
    assert_eq!(Address::from(0x10).checked_add(0x10), Some(Address::from(0x20)));
    assert_eq!(Address::from(u64::MAX).checked_add(1), None);
}

#[test]
fn test_address_ordering()
{
    let low = Address::new(0x1000);
    let high = Address::new(0x2000);
    assert!(low < high);
    assert_eq!(low, Address::from(0x1000));
}

#[test]
fn test_trace_style_default()
{
    assert_eq!(TraceStyle::default(), TraceStyle::FullSymbol);
}

#[test]
fn test_trace_style_parse()
{
    assert_eq!("modoff".parse::<TraceStyle>().unwrap(), TraceStyle::Modoff);
    assert_eq!("MODULE".parse::<TraceStyle>().unwrap(), TraceStyle::Modoff);
    assert_eq!("fullsymbol".parse::<TraceStyle>().unwrap(), TraceStyle::FullSymbol);
    assert_eq!("sym".parse::<TraceStyle>().unwrap(), TraceStyle::FullSymbol);

    let err = "lines".parse::<TraceStyle>().unwrap_err();
    assert!(err.contains("lines"));
}

#[test]
fn test_trace_style_display_round_trip()
{
    for style in [TraceStyle::Modoff, TraceStyle::FullSymbol] {
        assert_eq!(style.to_string().parse::<TraceStyle>().unwrap(), style);
    }
}

#[test]
fn test_architecture_debugger_dir()
{
    assert_eq!(Architecture::X86.debugger_dir(), "x86");
    assert_eq!(Architecture::X64.debugger_dir(), "x64");
    assert_eq!(Architecture::Arm64.debugger_dir(), "arm64");
    assert_eq!(Architecture::Unknown("riscv64").to_string(), "riscv64");
}

#[cfg(target_arch = "x86_64")]
#[test]
fn test_architecture_current()
{
    assert_eq!(Architecture::current(), Architecture::X64);
}

#[test]
fn test_build_info()
{
    assert!(!VERSION.is_empty());
    assert_eq!(SYSTEM, std::env::consts::OS);
}

#[cfg(not(windows))]
#[test]
fn test_no_engine_off_windows()
{
    let err = create_engine().err().expect("no engine backend off Windows");
    assert!(err.is_initialization_error());
}

#[cfg(windows)]
#[test]
fn test_engine_on_windows()
{
    let engine = create_engine().unwrap();
    assert_eq!(engine.name(), "dbgeng");
}
