//!This is the core library for the portio project. It holds the bus transport
//!contract, the register access helper built on top of it, and the port
//!accessor types that dispatchers produce from descriptor tables.

use std::collections::HashMap;
use std::fmt;

use error::PortError;

pub mod bits;
pub mod error;
pub mod mem;
pub mod register;
pub mod transport;

///A live accessor for one configured port.
///
///`get` reads the port's current value (cached for write-only hardware),
///`set` commands a new one. Read-only ports reject `set` with a
///configuration error.
pub trait PortAccessor<T>: Send {
    fn get(&mut self) -> Result<T, PortError>;
    fn set(&mut self, value: T) -> Result<(), PortError>;
}

///Fundamental port kinds held in a `PortMap`.
pub enum Port {
    Bool(Box<dyn PortAccessor<bool>>),
    Float(Box<dyn PortAccessor<f64>>),
}

impl Port {
    pub fn bool(accessor: impl PortAccessor<bool> + 'static) -> Self {
        Port::Bool(Box::new(accessor))
    }
    pub fn float(accessor: impl PortAccessor<f64> + 'static) -> Self {
        Port::Float(Box::new(accessor))
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(_) => f.write_str("Bool"),
            Self::Float(_) => f.write_str("Float"),
        }
    }
}

///Label-keyed set of live ports, built once by a dispatcher. The label set is
///fixed for the life of the map; only the underlying hardware state changes.
#[derive(Debug)]
pub struct PortMap {
    ports: HashMap<String, Port>,
}

impl PortMap {
    pub fn new(ports: HashMap<String, Port>) -> Self {
        Self { ports }
    }

    pub fn port(&mut self, label: &str) -> Option<&mut Port> {
        self.ports.get_mut(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn get_bool(&mut self, label: &str) -> Result<bool, PortError> {
        match self.ports.get_mut(label) {
            Some(Port::Bool(accessor)) => accessor.get(),
            Some(other) => Err(kind_mismatch(label, other, "Bool")),
            None => Err(unknown_label(label)),
        }
    }

    pub fn set_bool(&mut self, label: &str, value: bool) -> Result<(), PortError> {
        match self.ports.get_mut(label) {
            Some(Port::Bool(accessor)) => accessor.set(value),
            Some(other) => Err(kind_mismatch(label, other, "Bool")),
            None => Err(unknown_label(label)),
        }
    }

    pub fn get_float(&mut self, label: &str) -> Result<f64, PortError> {
        match self.ports.get_mut(label) {
            Some(Port::Float(accessor)) => accessor.get(),
            Some(other) => Err(kind_mismatch(label, other, "Float")),
            None => Err(unknown_label(label)),
        }
    }

    pub fn set_float(&mut self, label: &str, value: f64) -> Result<(), PortError> {
        match self.ports.get_mut(label) {
            Some(Port::Float(accessor)) => accessor.set(value),
            Some(other) => Err(kind_mismatch(label, other, "Float")),
            None => Err(unknown_label(label)),
        }
    }
}

fn kind_mismatch(label: &str, port: &Port, wanted: &str) -> PortError {
    PortError::config(format!("port {} is {:?}, not {}", label, port, wanted))
}

fn unknown_label(label: &str) -> PortError {
    PortError::config(format!("no port named {}", label))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cell {
        value: f64,
    }

    impl PortAccessor<f64> for Cell {
        fn get(&mut self) -> Result<f64, PortError> {
            Ok(self.value)
        }
        fn set(&mut self, value: f64) -> Result<(), PortError> {
            self.value = value;
            Ok(())
        }
    }

    #[test]
    fn port_map_routes_by_label_and_kind() {
        let mut map = PortMap::new(HashMap::from([(
            "dac".to_owned(),
            Port::float(Cell { value: 0.25 }),
        )]));

        assert_eq!(map.get_float("dac").unwrap(), 0.25);
        map.set_float("dac", 0.5).unwrap();
        assert_eq!(map.get_float("dac").unwrap(), 0.5);

        assert!(map.get_bool("dac").unwrap_err().is_config());
        assert!(map.get_float("missing").unwrap_err().is_config());
    }
}
