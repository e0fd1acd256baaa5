mod devres;
mod fwnode;
mod registry;
mod sysfs;
