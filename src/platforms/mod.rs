//! Catalog of supported platforms, in registration order

mod dotnet;
mod golang;
mod java;
mod nodejs;
mod php;
mod python;
mod ruby;

pub use dotnet::DOTNET;
pub use golang::GOLANG;
pub use java::JAVA;
pub use nodejs::NODEJS;
pub use php::PHP;
pub use python::PYTHON;
pub use ruby::RUBY;

use crate::platform::PlatformSpec;

/// Every built-in platform; script snippets follow this order
pub fn all() -> [&'static PlatformSpec; 7] {
    [&DOTNET, &NODEJS, &PYTHON, &PHP, &RUBY, &JAVA, &GOLANG]
}
