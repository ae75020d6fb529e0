pub mod block;
pub mod broadcast;
pub mod canvas;
pub mod gateway;
pub mod history;
pub mod newsletter;
pub mod notice;
pub mod publish;
pub mod render;
pub mod subscription;
pub mod templates;

pub use block::{
    AudioContent, Block, BlockContent, BlockSettings, BlockType, ButtonContent, ImageContent,
    TextContent,
};
pub use broadcast::{BroadcastOptions, Broadcaster};
pub use canvas::EditorSession;
pub use gateway::{
    DeliveryReport, Mailer, MediaStore, NewsletterStore, NoticeStore, OutgoingEmail, SendLog,
    SubscriberStore,
};
pub use history::BlockHistory;
pub use newsletter::{
    NewNewsletter, NewNotice, Newsletter, NewsletterContent, NewsletterPatch, Notice, NoticePatch,
    SendRecord, SendStatus, SortOrder, Subscriber,
};
pub use notice::Notices;
pub use subscription::{ConfirmOutcome, ImportReport, SubscribeOutcome, Subscriptions};
pub use templates::Template;
