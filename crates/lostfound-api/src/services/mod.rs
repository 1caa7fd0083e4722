pub mod email;
pub mod events;
pub mod lifecycle;
pub mod notifications;
pub mod payment;

pub use email::{EmailService, Mailer};
pub use events::{EventPublisher, TaskQueueEventPublisher};
pub use lifecycle::{LifecycleManager, LifecycleSettings};
pub use payment::{DisabledPaymentGateway, PaymentGateway, PaymentIntent, StripePaymentGateway};
