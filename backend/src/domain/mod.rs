pub mod calendar;
pub mod payments;

pub use calendar::CalendarService;
pub use payments::{
    ConflictResolver, ConflictVerdict, FieldCipher, IdentityCipher, LastWriteWinsResolver,
    LoggingRemoteGateway, PaymentError, PaymentService, RemoteGateway,
};
