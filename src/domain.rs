mod contact_form;
mod contact_message;
mod message_body;
mod visitor_email;
mod visitor_name;

pub use contact_form::{ContactField, ContactForm};
pub use contact_message::ContactMessage;
pub use message_body::MessageBody;
pub use visitor_email::VisitorEmail;
pub use visitor_name::VisitorName;
