mod checkout;
mod helpers;
mod mocks;
mod offers;
mod orders;
mod webhooks;
