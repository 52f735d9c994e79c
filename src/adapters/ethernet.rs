//! Ethernet adapter (LAN8720 over RMII).
//!
//! Brings the EMAC up without waiting for link or DHCP, so the control
//! loop starts immediately whether or not a cable is plugged in.  Link
//! and address changes are picked up by [`EthernetLink::poll`], which the
//! scheduler's idle hook calls between sleep slices.
//!
//! Static addressing swaps in a netif configured from the validated
//! [`NetworkSettings`]; DHCP uses the default Ethernet client netif.

use esp_idf_svc::eth::{EspEth, EthDriver, RmiiClockConfig, RmiiEth, RmiiEthChipset};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{self, AnyIOPin, AnyOutputPin};
use esp_idf_svc::hal::mac::MAC;
use esp_idf_svc::ipv4::{
    ClientConfiguration as IpClientConfiguration, ClientSettings as IpClientSettings,
    Configuration as IpConfiguration, Mask, Subnet,
};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration};
use log::{error, info, warn};

use crate::config::{EthClockMode, EthConfig, PhyChip};
use crate::error::NetworkError;
use crate::network::{AddressingMode, NetworkSettings};

/// The RMII data lines are fixed by the ESP32 EMAC.
pub struct RmiiPins {
    pub rxd0: gpio::Gpio25,
    pub rxd1: gpio::Gpio26,
    pub crs_dv: gpio::Gpio27,
    pub txd1: gpio::Gpio22,
    pub tx_en: gpio::Gpio21,
    pub txd0: gpio::Gpio19,
    /// Reference clock candidates; only the one selected by
    /// [`EthClockMode`] is used.
    pub gpio0: gpio::Gpio0,
    pub gpio16: gpio::Gpio16,
    pub gpio17: gpio::Gpio17,
}

fn chipset(phy: PhyChip) -> RmiiEthChipset {
    match phy {
        PhyChip::Lan8720 => RmiiEthChipset::LAN87XX,
        PhyChip::Ip101 => RmiiEthChipset::IP101,
        PhyChip::Rtl8201 => RmiiEthChipset::RTL8201,
        PhyChip::Dp83848 => RmiiEthChipset::DP83848,
    }
}

fn static_netif_conf(settings: &NetworkSettings) -> Result<Option<NetifConfiguration>, NetworkError> {
    let AddressingMode::Static(addr) = settings.mode else {
        return Ok(None);
    };

    let mask = Mask::try_from(addr.subnet).map_err(|_| {
        error!("Ethernet: subnet {} rejected by netif", addr.subnet);
        NetworkError::NetifFailed
    })?;

    let mut conf = NetifConfiguration::eth_default_client();
    conf.ip_configuration = Some(IpConfiguration::Client(IpClientConfiguration::Fixed(
        IpClientSettings {
            ip: addr.ip,
            subnet: Subnet {
                gateway: addr.gateway,
                mask,
            },
            dns: Some(addr.dns),
            secondary_dns: None,
        },
    )));
    Ok(Some(conf))
}

/// Running Ethernet interface plus last observed link state.
pub struct EthernetLink {
    eth: EspEth<'static, RmiiEth>,
    was_up: bool,
}

impl EthernetLink {
    /// Create the driver, attach the netif and start the MAC.  Returns as
    /// soon as the driver is started; link-up happens in the background.
    pub fn start(
        mac: MAC,
        pins: RmiiPins,
        eth_cfg: &EthConfig,
        settings: &NetworkSettings,
        sysloop: EspSystemEventLoop,
    ) -> Result<Self, NetworkError> {
        // SAFETY: pin numbers were validated against range, direction and
        // conflicts in `HardwareConfig::validate`; nothing else owns them.
        let mdc = unsafe { AnyOutputPin::new(eth_cfg.mdc_pin) };
        let mdio = unsafe { AnyIOPin::new(eth_cfg.mdio_pin) };

        let clock: RmiiClockConfig<gpio::Gpio0, gpio::Gpio16, gpio::Gpio17> = match eth_cfg.clock {
            EthClockMode::Gpio0In => RmiiClockConfig::Input(pins.gpio0),
            EthClockMode::Gpio0Out => RmiiClockConfig::OutputGpio0(pins.gpio0),
            EthClockMode::Gpio16Out => RmiiClockConfig::OutputGpio16(pins.gpio16),
            EthClockMode::Gpio17Out => RmiiClockConfig::OutputInvertedGpio17(pins.gpio17),
        };

        // PHY power is driven by hw_init, so no reset pin is handed over.
        let driver = EthDriver::new_rmii(
            mac,
            pins.rxd0,
            pins.rxd1,
            pins.crs_dv,
            mdc,
            pins.txd1,
            pins.tx_en,
            pins.txd0,
            mdio,
            clock,
            Option::<AnyOutputPin>::None,
            chipset(eth_cfg.phy),
            Some(u32::from(eth_cfg.phy_addr)),
            sysloop,
        )
        .map_err(|e| {
            error!("Ethernet: driver init failed: {e}");
            NetworkError::EthInitFailed
        })?;

        let mut eth = match static_netif_conf(settings)? {
            Some(conf) => {
                let netif = EspNetif::new_with_conf(&conf).map_err(|e| {
                    error!("Ethernet: static netif creation failed: {e}");
                    NetworkError::NetifFailed
                })?;
                EspEth::wrap_all(driver, netif)
            }
            None => EspEth::wrap(driver),
        }
        .map_err(|e| {
            error!("Ethernet: netif attach failed: {e}");
            NetworkError::NetifFailed
        })?;

        eth.start().map_err(|e| {
            error!("Ethernet: start failed: {e}");
            NetworkError::EthInitFailed
        })?;

        info!(
            "Ethernet: started ({:?} @ addr {}, {})",
            eth_cfg.phy,
            eth_cfg.phy_addr,
            if settings.is_dhcp() { "DHCP" } else { "static" }
        );
        Ok(Self { eth, was_up: false })
    }

    /// Log link/IP transitions.  Cheap; call as often as convenient.
    pub fn poll(&mut self) {
        let up = self.eth.is_up().unwrap_or(false);
        if up == self.was_up {
            return;
        }
        self.was_up = up;

        if up {
            match self.eth.netif().get_ip_info() {
                Ok(info) => info!("Ethernet: up, ip={} gw={}", info.ip, info.subnet.gateway),
                Err(e) => warn!("Ethernet: up, ip info unavailable: {e}"),
            }
        } else {
            warn!("Ethernet: link down, dashboard unreachable");
        }
    }
}
