//! Wording of notification mails.

use lostfound_core::models::{
    ClientContact, ClientItemFoundPayload, StaffDeliveryRequestedPayload,
    StaffPickupRequestedPayload,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn item_found_mail(
    contact: &ClientContact,
    payload: &ClientItemFoundPayload,
    frontend_url: &str,
) -> OutgoingMail {
    let base = frontend_url.trim_end_matches('/');
    OutgoingMail {
        to: contact.email.clone(),
        subject: format!("We found your item: {}", payload.title),
        body: format!(
            "Hello {name},\n\n\
             Good news: our staff found the item you reported ({title}, reference {id}).\n\n\
             Tell us how you would like to get it back:\n\
             - Pick it up at the front desk: {base}/items/{id}/pickup\n\
             - Have it delivered to you: {base}/items/{id}/delivery\n\n\
             The Lost & Found desk",
            name = contact.name,
            title = payload.title,
            id = payload.item_id,
            base = base,
        ),
    }
}

pub fn staff_pickup_mail(staff_email: &str, payload: &StaffPickupRequestedPayload) -> OutgoingMail {
    OutgoingMail {
        to: staff_email.to_string(),
        subject: format!("Pickup requested: {} ({})", payload.title, payload.item_id),
        body: format!(
            "A guest will collect item {id} ({title}) at the front desk.\n\
             Guest contact: {contact}\n\n\
             Please keep the item ready and mark it Delivered once handed over.",
            id = payload.item_id,
            title = payload.title,
            contact = payload.client_email.as_deref().unwrap_or("not provided"),
        ),
    }
}

pub fn staff_delivery_mail(
    staff_email: &str,
    payload: &StaffDeliveryRequestedPayload,
) -> OutgoingMail {
    OutgoingMail {
        to: staff_email.to_string(),
        subject: format!("Delivery requested: {} ({})", payload.title, payload.item_id),
        body: format!(
            "Item {id} ({title}) is to be shipped to {city}.\n\
             Guest contact: {contact}\n\n\
             The full address is on the item record. Ship once the delivery fee is paid.",
            id = payload.item_id,
            title = payload.title,
            city = payload.city,
            contact = payload.client_email.as_deref().unwrap_or("not provided"),
        ),
    }
}
