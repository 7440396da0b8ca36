//! Fixed-capacity channel table.
//!
//! Channels are serviced in registration order on every crossing and are
//! never removed, so a [`ChannelId`] doubles as the table index.

use heapless::Vec;

use crate::channel::{Channel, ChannelId};
use crate::config::{ChannelConfig, DimmerConfig};
use crate::dimmer::DimmerError;

/// Default number of channels the engine can drive.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// Ordered collection of registered channels.
#[derive(Clone, Debug)]
pub struct ChannelRegistry<const CAPACITY: usize = DEFAULT_CHANNEL_CAPACITY> {
    channels: Vec<Channel, CAPACITY>,
}

impl<const CAPACITY: usize> ChannelRegistry<CAPACITY> {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Validates `config` and appends a new dark channel.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::Config`] for an invalid configuration and
    /// [`DimmerError::CapacityExceeded`] once every slot is taken.
    pub fn register(
        &mut self,
        config: ChannelConfig,
        system: &DimmerConfig,
    ) -> Result<ChannelId, DimmerError> {
        config.validate(system).map_err(DimmerError::Config)?;

        let index = u8::try_from(self.channels.len()).map_err(|_| DimmerError::CapacityExceeded)?;
        let id = ChannelId::new(index);
        self.channels
            .push(Channel::new(id, config))
            .map_err(|_| DimmerError::CapacityExceeded)?;
        Ok(id)
    }

    /// Looks up a channel by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for identifiers never handed out.
    pub fn get(&self, id: ChannelId) -> Result<&Channel, DimmerError> {
        self.channels
            .get(id.as_index())
            .ok_or(DimmerError::UnknownChannel(id))
    }

    /// Mutable variant of [`ChannelRegistry::get`].
    ///
    /// # Errors
    ///
    /// Returns [`DimmerError::UnknownChannel`] for identifiers never handed out.
    pub fn get_mut(&mut self, id: ChannelId) -> Result<&mut Channel, DimmerError> {
        self.channels
            .get_mut(id.as_index())
            .ok_or(DimmerError::UnknownChannel(id))
    }

    /// Iterates channels in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Mutably iterates channels in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl<const CAPACITY: usize> Default for ChannelRegistry<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn identifiers_follow_registration_order() {
        let mut registry: ChannelRegistry<3> = ChannelRegistry::new();
        let system = DimmerConfig::default();
        let a = registry.register(ChannelConfig::phase_control(), &system).unwrap();
        let b = registry.register(ChannelConfig::pulse_density(), &system).unwrap();
        assert_eq!((a.raw(), b.raw()), (0, 1));

        let order: std::vec::Vec<_> = registry.iter().map(Channel::id).collect();
        assert_eq!(order, [a, b]);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut registry: ChannelRegistry<1> = ChannelRegistry::new();
        let system = DimmerConfig::default();
        registry.register(ChannelConfig::phase_control(), &system).unwrap();
        assert_eq!(
            registry.register(ChannelConfig::phase_control(), &system),
            Err(DimmerError::CapacityExceeded)
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut registry: ChannelRegistry<2> = ChannelRegistry::new();
        let system = DimmerConfig::default().with_debounce(Duration::from_millis(12));
        assert_eq!(
            registry.register(ChannelConfig::phase_control(), &system),
            Err(DimmerError::Config(ConfigError::DebounceTooLong))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_identifier_is_reported() {
        let registry: ChannelRegistry<2> = ChannelRegistry::new();
        let id = ChannelId::new(1);
        assert!(matches!(registry.get(id), Err(DimmerError::UnknownChannel(missing)) if missing == id));
    }
}
