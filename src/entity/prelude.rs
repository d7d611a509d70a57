//! 预导入模块，方便使用

pub use super::attendances::{
    ActiveModel as AttendanceActiveModel, Entity as Attendances, Model as AttendanceModel,
};
pub use super::meeting_participants::{
    ActiveModel as MeetingParticipantActiveModel, Entity as MeetingParticipants,
    Model as MeetingParticipantModel,
};
pub use super::meetings::{
    ActiveModel as MeetingActiveModel, Entity as Meetings, Model as MeetingModel,
};
pub use super::notifications::{
    ActiveModel as NotificationActiveModel, Entity as Notifications, Model as NotificationModel,
};
pub use super::student_emotions::{
    ActiveModel as StudentEmotionActiveModel, Entity as StudentEmotions,
    Model as StudentEmotionModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
